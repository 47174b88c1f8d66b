use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cop::{Cop, CopConfig, Offense};
use crate::diagnostic::{Diagnostic, Severity};
use crate::tree::Node;

thread_local! {
    static IN_CHECK: Cell<bool> = const { Cell::new(false) };
}

static HOOK: Once = Once::new();
static DEBUG_PANICS: AtomicBool = AtomicBool::new(false);

/// Keep panics raised inside `Cop::check_node` off stderr. They are already
/// reported as internal errors; with `debug` they are also echoed as debug
/// lines. Panics anywhere else still reach the previous hook.
pub fn quiet_cop_panics(debug: bool) {
    DEBUG_PANICS.store(debug, Ordering::Relaxed);
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !IN_CHECK.with(Cell::get) {
                previous(info);
            } else if DEBUG_PANICS.load(Ordering::Relaxed) {
                eprintln!("debug: cop {info}");
            }
        }));
    });
}

/// A cop enabled for the current walk, with its resolved config and severity.
pub struct ActiveCop<'a> {
    pub cop: &'a dyn Cop,
    pub config: &'a CopConfig,
    pub severity: Severity,
}

/// Pre-order walk applying every active cop at every node.
pub struct CopWalker<'a> {
    pub cops: Vec<ActiveCop<'a>>,
    pub path: &'a str,
    pub stop_after_first: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> CopWalker<'a> {
    pub fn new(cops: Vec<ActiveCop<'a>>, path: &'a str) -> Self {
        Self {
            cops,
            path,
            stop_after_first: false,
            diagnostics: Vec::new(),
        }
    }

    pub fn walk(&mut self, root: &Node) {
        if self.cops.is_empty() {
            return;
        }
        // Explicit stack: node, then children left to right.
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let found = self.visit(node);
            let hit = !found.is_empty();
            self.diagnostics.extend(found);
            if self.stop_after_first && hit {
                return;
            }
            stack.extend(node.child_nodes().rev());
        }
    }

    fn visit(&self, node: &Node) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for active in &self.cops {
            IN_CHECK.with(|c| c.set(true));
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                active.cop.check_node(node, active.config)
            }));
            IN_CHECK.with(|c| c.set(false));
            match result {
                Ok(Ok(offenses)) => {
                    found.extend(offenses.into_iter().map(|o| self.diagnostic(active, o)));
                }
                Ok(Err(e)) => {
                    let detail = format!("{e:#}");
                    found.push(self.internal_error(active, node, &detail));
                }
                Err(payload) => {
                    let detail = panic_message(payload.as_ref());
                    found.push(self.internal_error(active, node, &detail));
                }
            }
        }
        found
    }

    fn diagnostic(&self, active: &ActiveCop<'_>, offense: Offense) -> Diagnostic {
        Diagnostic {
            path: self.path.to_string(),
            location: offense.range.begin,
            end: offense.range.end,
            severity: active.severity,
            cop_name: active.cop.name().to_string(),
            message: offense.message,
        }
    }

    fn internal_error(&self, active: &ActiveCop<'_>, node: &Node, detail: &str) -> Diagnostic {
        let range = node.range();
        Diagnostic {
            path: self.path.to_string(),
            location: range.begin,
            end: range.end,
            severity: Severity::Internal,
            cop_name: active.cop.name().to_string(),
            message: format!(
                "An error occurred while {} cop was inspecting {} node at {}:{}: {}",
                active.cop.name(),
                node.kind(),
                range.begin.line,
                range.begin.column,
                detail,
            ),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
