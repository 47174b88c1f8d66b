//! Lowering from Prism's AST into `tree::Node`.
//!
//! Kinds and child layouts follow the Parser gem: a call is
//! `(send receiver :name args...)`, a call with a block is
//! `(block (send ...) (args ...) body)`, a bare constant is
//! `(const nil :Name)`. Prism node types without a dedicated mapping keep
//! their lowered children under an opaque kind.

use ruby_prism::Visit;

use crate::parse::source::SourceFile;
use crate::tree::{Child, Node, Range, Scalar};

/// Lower a whole program. An empty program becomes an empty `(begin)`.
pub fn lower_program(source: &SourceFile, root: &ruby_prism::Node<'_>) -> Node {
    let lowerer = Lowerer { source };
    let range = source.prism_range(&root.location());
    if let Some(program) = root.as_program_node() {
        let body: Vec<ruby_prism::Node<'_>> = program.statements().body().iter().collect();
        if body.len() == 1 {
            return lowerer.lower(&body[0]);
        }
        let children = body.iter().map(|n| Child::Node(lowerer.lower(n))).collect();
        return Node::new("begin", children, range);
    }
    lowerer.lower(root)
}

struct Lowerer<'a> {
    source: &'a SourceFile,
}

fn name(bytes: &[u8]) -> Child {
    Child::Scalar(Scalar::Symbol(String::from_utf8_lossy(bytes).into_owned()))
}

fn string(bytes: &[u8]) -> Child {
    Child::Scalar(Scalar::Str(String::from_utf8_lossy(bytes).into_owned()))
}

/// Parse Ruby integer literal text: `1_000`, `-42`, `0x1f`, `0b101`, `0o17`, `017`.
fn integer_value(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(b) = lower.strip_prefix("0x") {
        (16, b)
    } else if let Some(b) = lower.strip_prefix("0b") {
        (2, b)
    } else if let Some(b) = lower.strip_prefix("0o") {
        (8, b)
    } else if let Some(b) = lower.strip_prefix("0d") {
        (10, b)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    let magnitude = i64::from_str_radix(body, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn float_value(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    cleaned.parse().ok()
}

impl Lowerer<'_> {
    fn range(&self, loc: &ruby_prism::Location<'_>) -> Range {
        self.source.prism_range(loc)
    }

    fn node(&self, kind: &str, children: Vec<Child>, loc: &ruby_prism::Location<'_>) -> Node {
        Node::new(kind, children, self.range(loc))
    }

    fn child(&self, node: Option<ruby_prism::Node<'_>>) -> Child {
        match node {
            Some(n) => Child::Node(self.lower(&n)),
            None => Child::Nil,
        }
    }

    /// A body slot. Prism wraps bodies in a StatementsNode; Parser does not.
    fn body(&self, node: Option<ruby_prism::Node<'_>>) -> Child {
        match node {
            Some(n) => match n.as_statements_node() {
                Some(stmts) => self.statements(Some(stmts)),
                None => Child::Node(self.lower(&n)),
            },
            None => Child::Nil,
        }
    }

    /// A statements list: absent, a single expression, or `(begin ...)`.
    fn statements(&self, stmts: Option<ruby_prism::StatementsNode<'_>>) -> Child {
        let Some(stmts) = stmts else {
            return Child::Nil;
        };
        let body: Vec<ruby_prism::Node<'_>> = stmts.body().iter().collect();
        match body.as_slice() {
            [] => Child::Nil,
            [single] => Child::Node(self.lower(single)),
            many => {
                let children = many.iter().map(|n| Child::Node(self.lower(n))).collect();
                Child::Node(self.node("begin", children, &stmts.location()))
            }
        }
    }

    fn list<'pr>(&self, nodes: impl Iterator<Item = ruby_prism::Node<'pr>>) -> Vec<Child> {
        nodes.map(|n| Child::Node(self.lower(&n))).collect()
    }

    fn arguments(&self, args: Option<ruby_prism::ArgumentsNode<'_>>) -> Vec<Child> {
        match args {
            Some(args) => self.list(args.arguments().iter()),
            None => Vec::new(),
        }
    }

    /// `(args ...)` from a parameters node; absent parameters give an empty list.
    fn parameters(
        &self,
        params: Option<ruby_prism::ParametersNode<'_>>,
        fallback: &ruby_prism::Location<'_>,
    ) -> Node {
        let Some(params) = params else {
            let at = self.source.location(fallback.start_offset());
            return Node::new("args", Vec::new(), Range::new(at, at));
        };
        let mut children = self.list(params.requireds().iter());
        children.extend(self.list(params.optionals().iter()));
        if let Some(rest) = params.rest() {
            children.push(Child::Node(self.lower(&rest)));
        }
        children.extend(self.list(params.posts().iter()));
        children.extend(self.list(params.keywords().iter()));
        if let Some(kwrest) = params.keyword_rest() {
            children.push(Child::Node(self.lower(&kwrest)));
        }
        if let Some(block) = params.block() {
            children.push(Child::Node(self.lower(&block.as_node())));
        }
        self.node("args", children, &params.location())
    }

    fn call(&self, call: &ruby_prism::CallNode<'_>) -> Node {
        let kind = if call
            .call_operator_loc()
            .is_some_and(|loc| loc.as_slice() == b"&.")
        {
            "csend"
        } else {
            "send"
        };
        let loc = call.location();

        let mut children = vec![self.child(call.receiver()), name(call.name().as_slice())];
        children.extend(self.arguments(call.arguments()));

        let block = call.block();
        let block_node = block.as_ref().and_then(|b| b.as_block_node());
        if block_node.is_none() {
            if let Some(pass) = block {
                children.push(Child::Node(self.lower(&pass)));
            }
        }

        // The call itself ends before its block, if any.
        let end = match &block_node {
            Some(b) => self.call_end(call).unwrap_or(b.location().start_offset()),
            None => loc.end_offset(),
        };
        let mut send = Node::new(kind, children, self.source.range(loc.start_offset(), end));
        if let Some(selector) = call.message_loc() {
            send = send.with_selector(self.range(&selector));
        }

        match block_node {
            Some(b) => {
                let params = b
                    .parameters()
                    .and_then(|p| p.as_block_parameters_node())
                    .and_then(|p| p.parameters());
                let args = self.parameters(params, &b.location());
                self.node(
                    "block",
                    vec![Child::Node(send), Child::Node(args), self.body(b.body())],
                    &loc,
                )
            }
            None => send,
        }
    }

    /// End offset of the call expression without its block.
    fn call_end(&self, call: &ruby_prism::CallNode<'_>) -> Option<usize> {
        if let Some(close) = call.closing_loc() {
            return Some(close.end_offset());
        }
        if let Some(args) = call.arguments() {
            return Some(args.location().end_offset());
        }
        call.message_loc()
            .map(|m| m.end_offset())
            .or_else(|| call.receiver().map(|r| r.location().end_offset()))
    }

    fn lower(&self, node: &ruby_prism::Node<'_>) -> Node {
        let loc = node.location();

        if let Some(call) = node.as_call_node() {
            return self.call(&call);
        }
        if let Some(n) = node.as_integer_node() {
            let text = String::from_utf8_lossy(n.location().as_slice()).into_owned();
            let value = match integer_value(&text) {
                Some(v) => Scalar::Int(v),
                None => Scalar::Str(text),
            };
            return self.node("int", vec![Child::Scalar(value)], &loc);
        }
        if node.as_source_line_node().is_some() {
            // `__LINE__` is the literal line it sits on.
            let (line, _) = self.source.offset_to_line_col(loc.start_offset());
            return self.node("int", vec![Child::Scalar(Scalar::Int(line as i64))], &loc);
        }
        if let Some(n) = node.as_float_node() {
            let text = String::from_utf8_lossy(n.location().as_slice()).into_owned();
            let value = match float_value(&text) {
                Some(v) => Scalar::Float(v),
                None => Scalar::Str(text),
            };
            return self.node("float", vec![Child::Scalar(value)], &loc);
        }
        if let Some(n) = node.as_symbol_node() {
            return self.node("sym", vec![name(n.unescaped())], &loc);
        }
        if let Some(n) = node.as_string_node() {
            return self.node("str", vec![string(n.unescaped())], &loc);
        }
        if let Some(n) = node.as_x_string_node() {
            let part = self.node("str", vec![string(n.unescaped())], &loc);
            return self.node("xstr", vec![Child::Node(part)], &loc);
        }
        if let Some(n) = node.as_regular_expression_node() {
            let content = self.node("str", vec![string(n.unescaped())], &n.content_loc());
            let opts = self.node("regopt", Vec::new(), &n.closing_loc());
            return self.node("regexp", vec![Child::Node(content), Child::Node(opts)], &loc);
        }
        if let Some(n) = node.as_interpolated_string_node() {
            return self.node("dstr", self.list(n.parts().iter()), &loc);
        }
        if let Some(n) = node.as_interpolated_symbol_node() {
            return self.node("dsym", self.list(n.parts().iter()), &loc);
        }
        if let Some(n) = node.as_embedded_statements_node() {
            let body = match self.statements(n.statements()) {
                Child::Nil => Vec::new(),
                Child::Node(inner) if inner.kind() == "begin" => inner.into_children(),
                other => vec![other],
            };
            return self.node("begin", body, &loc);
        }
        if let Some(n) = node.as_array_node() {
            return self.node("array", self.list(n.elements().iter()), &loc);
        }
        if let Some(n) = node.as_hash_node() {
            return self.node("hash", self.list(n.elements().iter()), &loc);
        }
        if let Some(n) = node.as_keyword_hash_node() {
            return self.node("hash", self.list(n.elements().iter()), &loc);
        }
        if let Some(n) = node.as_assoc_node() {
            let children = vec![Child::Node(self.lower(&n.key())), Child::Node(self.lower(&n.value()))];
            return self.node("pair", children, &loc);
        }
        if let Some(n) = node.as_assoc_splat_node() {
            return self.node("kwsplat", vec![self.child(n.value())], &loc);
        }
        if let Some(n) = node.as_splat_node() {
            return self.node("splat", vec![self.child(n.expression())], &loc);
        }
        if let Some(n) = node.as_block_argument_node() {
            return self.node("block_pass", vec![self.child(n.expression())], &loc);
        }
        if let Some(n) = node.as_range_node() {
            let kind = if n.operator_loc().as_slice() == b"..." {
                "erange"
            } else {
                "irange"
            };
            return self.node(kind, vec![self.child(n.left()), self.child(n.right())], &loc);
        }
        if let Some(n) = node.as_local_variable_read_node() {
            return self.node("lvar", vec![name(n.name().as_slice())], &loc);
        }
        if let Some(n) = node.as_instance_variable_read_node() {
            return self.node("ivar", vec![name(n.name().as_slice())], &loc);
        }
        if let Some(n) = node.as_class_variable_read_node() {
            return self.node("cvar", vec![name(n.name().as_slice())], &loc);
        }
        if let Some(n) = node.as_global_variable_read_node() {
            return self.node("gvar", vec![name(n.name().as_slice())], &loc);
        }
        if let Some(n) = node.as_local_variable_write_node() {
            let children = vec![name(n.name().as_slice()), Child::Node(self.lower(&n.value()))];
            return self.node("lvasgn", children, &loc);
        }
        if let Some(n) = node.as_instance_variable_write_node() {
            let children = vec![name(n.name().as_slice()), Child::Node(self.lower(&n.value()))];
            return self.node("ivasgn", children, &loc);
        }
        if let Some(n) = node.as_class_variable_write_node() {
            let children = vec![name(n.name().as_slice()), Child::Node(self.lower(&n.value()))];
            return self.node("cvasgn", children, &loc);
        }
        if let Some(n) = node.as_global_variable_write_node() {
            let children = vec![name(n.name().as_slice()), Child::Node(self.lower(&n.value()))];
            return self.node("gvasgn", children, &loc);
        }
        if let Some(n) = node.as_constant_write_node() {
            let children = vec![
                Child::Nil,
                name(n.name().as_slice()),
                Child::Node(self.lower(&n.value())),
            ];
            return self.node("casgn", children, &loc);
        }
        if let Some(n) = node.as_constant_read_node() {
            return self.node("const", vec![Child::Nil, name(n.name().as_slice())], &loc);
        }
        if let Some(n) = node.as_constant_path_node() {
            let parent = match n.parent() {
                Some(p) => Child::Node(self.lower(&p)),
                // `::Foo`
                None => Child::Node(self.node("cbase", Vec::new(), &n.delimiter_loc())),
            };
            let const_name = match n.name() {
                Some(id) => name(id.as_slice()),
                None => Child::Nil,
            };
            return self.node("const", vec![parent, const_name], &loc);
        }
        if node.as_true_node().is_some() {
            return self.node("true", Vec::new(), &loc);
        }
        if node.as_false_node().is_some() {
            return self.node("false", Vec::new(), &loc);
        }
        if node.as_nil_node().is_some() {
            return self.node("nil", Vec::new(), &loc);
        }
        if node.as_self_node().is_some() {
            return self.node("self", Vec::new(), &loc);
        }
        if node.as_forwarding_super_node().is_some() {
            return self.node("zsuper", Vec::new(), &loc);
        }
        if let Some(n) = node.as_super_node() {
            return self.node("super", self.arguments(n.arguments()), &loc);
        }
        if let Some(n) = node.as_yield_node() {
            return self.node("yield", self.arguments(n.arguments()), &loc);
        }
        if let Some(n) = node.as_return_node() {
            return self.node("return", self.arguments(n.arguments()), &loc);
        }
        if let Some(n) = node.as_and_node() {
            let children = vec![Child::Node(self.lower(&n.left())), Child::Node(self.lower(&n.right()))];
            return self.node("and", children, &loc);
        }
        if let Some(n) = node.as_or_node() {
            let children = vec![Child::Node(self.lower(&n.left())), Child::Node(self.lower(&n.right()))];
            return self.node("or", children, &loc);
        }
        if let Some(n) = node.as_if_node() {
            let children = vec![
                Child::Node(self.lower(&n.predicate())),
                self.statements(n.statements()),
                self.child(n.subsequent()),
            ];
            return self.node("if", children, &loc);
        }
        if let Some(n) = node.as_unless_node() {
            // `unless c; a; else; b; end` is `(if c b a)`
            let otherwise = match n.else_clause() {
                Some(e) => self.statements(e.statements()),
                None => Child::Nil,
            };
            let children = vec![
                Child::Node(self.lower(&n.predicate())),
                otherwise,
                self.statements(n.statements()),
            ];
            return self.node("if", children, &loc);
        }
        if let Some(n) = node.as_else_node() {
            // Only reached for `else` as an if-subsequent; Parser has no else node.
            return match self.statements(n.statements()) {
                Child::Node(inner) => inner,
                _ => self.node("begin", Vec::new(), &loc),
            };
        }
        if let Some(n) = node.as_case_node() {
            let mut children = vec![self.child(n.predicate())];
            children.extend(self.list(n.conditions().iter()));
            children.push(match n.else_clause() {
                Some(e) => self.statements(e.statements()),
                None => Child::Nil,
            });
            return self.node("case", children, &loc);
        }
        if let Some(n) = node.as_when_node() {
            let mut children = self.list(n.conditions().iter());
            children.push(self.statements(n.statements()));
            return self.node("when", children, &loc);
        }
        if let Some(n) = node.as_while_node() {
            let children = vec![Child::Node(self.lower(&n.predicate())), self.statements(n.statements())];
            return self.node("while", children, &loc);
        }
        if let Some(n) = node.as_until_node() {
            let children = vec![Child::Node(self.lower(&n.predicate())), self.statements(n.statements())];
            return self.node("until", children, &loc);
        }
        if let Some(n) = node.as_parentheses_node() {
            let children = match n.body() {
                Some(body) => match body.as_statements_node() {
                    Some(stmts) => self.list(stmts.body().iter()),
                    None => vec![Child::Node(self.lower(&body))],
                },
                None => Vec::new(),
            };
            return self.node("begin", children, &loc);
        }
        if let Some(n) = node.as_statements_node() {
            return self.node("begin", self.list(n.body().iter()), &loc);
        }
        if let Some(n) = node.as_begin_node() {
            let mut children = match n.statements() {
                Some(stmts) => self.list(stmts.body().iter()),
                None => Vec::new(),
            };
            if let Some(rescue) = n.rescue_clause() {
                children.push(Child::Node(self.lower(&rescue.as_node())));
            }
            if let Some(ensure) = n.ensure_clause() {
                children.push(Child::Node(self.lower(&ensure.as_node())));
            }
            return self.node("kwbegin", children, &loc);
        }
        if let Some(n) = node.as_def_node() {
            let params = self.parameters(n.parameters(), &n.name_loc());
            let mut children = Vec::new();
            let kind = match n.receiver() {
                Some(recv) => {
                    children.push(Child::Node(self.lower(&recv)));
                    "defs"
                }
                None => "def",
            };
            children.push(name(n.name().as_slice()));
            children.push(Child::Node(params));
            children.push(self.body(n.body()));
            return self
                .node(kind, children, &loc)
                .with_selector(self.range(&n.name_loc()));
        }
        if let Some(n) = node.as_class_node() {
            let children = vec![
                Child::Node(self.lower(&n.constant_path())),
                self.child(n.superclass()),
                self.body(n.body()),
            ];
            return self.node("class", children, &loc);
        }
        if let Some(n) = node.as_module_node() {
            let children = vec![Child::Node(self.lower(&n.constant_path())), self.body(n.body())];
            return self.node("module", children, &loc);
        }
        if let Some(n) = node.as_singleton_class_node() {
            let children = vec![Child::Node(self.lower(&n.expression())), self.body(n.body())];
            return self.node("sclass", children, &loc);
        }
        if let Some(n) = node.as_lambda_node() {
            // `-> (x) { }` is `(block (lambda) (args ...) body)`
            let lambda = self.node("lambda", Vec::new(), &n.operator_loc());
            let params = n
                .parameters()
                .and_then(|p| p.as_block_parameters_node())
                .and_then(|p| p.parameters());
            let args = self.parameters(params, &n.operator_loc());
            let children = vec![Child::Node(lambda), Child::Node(args), self.body(n.body())];
            return self.node("block", children, &loc);
        }
        if let Some(n) = node.as_required_parameter_node() {
            return self.node("arg", vec![name(n.name().as_slice())], &loc);
        }
        if let Some(n) = node.as_optional_parameter_node() {
            let children = vec![name(n.name().as_slice()), Child::Node(self.lower(&n.value()))];
            return self.node("optarg", children, &loc);
        }
        if let Some(n) = node.as_rest_parameter_node() {
            let children = n.name().map(|id| name(id.as_slice())).into_iter().collect();
            return self.node("restarg", children, &loc);
        }
        if let Some(n) = node.as_required_keyword_parameter_node() {
            return self.node("kwarg", vec![name(n.name().as_slice())], &loc);
        }
        if let Some(n) = node.as_optional_keyword_parameter_node() {
            let children = vec![name(n.name().as_slice()), Child::Node(self.lower(&n.value()))];
            return self.node("kwoptarg", children, &loc);
        }
        if let Some(n) = node.as_keyword_rest_parameter_node() {
            let children = n.name().map(|id| name(id.as_slice())).into_iter().collect();
            return self.node("kwrestarg", children, &loc);
        }
        if let Some(n) = node.as_block_parameter_node() {
            let children = n.name().map(|id| name(id.as_slice())).into_iter().collect();
            return self.node("blockarg", children, &loc);
        }

        self.opaque(node)
    }

    /// Unmapped node type: keep its direct children under an opaque kind.
    fn opaque(&self, node: &ruby_prism::Node<'_>) -> Node {
        let mut collector = DirectChildren {
            depth: 0,
            children: Vec::new(),
        };
        collector.visit(node);
        let children = self.list(collector.children.into_iter());
        self.node(opaque_kind(node), children, &node.location())
    }
}

fn opaque_kind(node: &ruby_prism::Node<'_>) -> &'static str {
    match node {
        ruby_prism::Node::RescueNode { .. } => "resbody",
        ruby_prism::Node::EnsureNode { .. } => "ensure",
        ruby_prism::Node::RescueModifierNode { .. } => "rescue",
        ruby_prism::Node::ForNode { .. } => "for",
        ruby_prism::Node::BreakNode { .. } => "break",
        ruby_prism::Node::NextNode { .. } => "next",
        ruby_prism::Node::RedoNode { .. } => "redo",
        ruby_prism::Node::RetryNode { .. } => "retry",
        ruby_prism::Node::DefinedNode { .. } => "defined?",
        ruby_prism::Node::MultiWriteNode { .. } => "masgn",
        ruby_prism::Node::LocalVariableOperatorWriteNode { .. } => "op_asgn",
        ruby_prism::Node::LocalVariableOrWriteNode { .. } => "or_asgn",
        ruby_prism::Node::LocalVariableAndWriteNode { .. } => "and_asgn",
        ruby_prism::Node::InstanceVariableOrWriteNode { .. } => "or_asgn",
        ruby_prism::Node::RationalNode { .. } => "rational",
        ruby_prism::Node::ImaginaryNode { .. } => "complex",
        ruby_prism::Node::InterpolatedRegularExpressionNode { .. } => "regexp",
        ruby_prism::Node::InterpolatedXStringNode { .. } => "xstr",
        ruby_prism::Node::CaseMatchNode { .. } => "case_match",
        ruby_prism::Node::InNode { .. } => "in_pattern",
        ruby_prism::Node::NumberedReferenceReadNode { .. } => "nth_ref",
        ruby_prism::Node::BackReferenceReadNode { .. } => "back_ref",
        _ => "unknown",
    }
}

/// Collects the direct children of the node it is first pointed at.
struct DirectChildren<'pr> {
    depth: usize,
    children: Vec<ruby_prism::Node<'pr>>,
}

impl<'pr> DirectChildren<'pr> {
    fn enter(&mut self, node: ruby_prism::Node<'pr>) {
        if self.depth == 1 {
            self.children.push(node);
        }
        self.depth += 1;
    }
}

impl<'pr> Visit<'pr> for DirectChildren<'pr> {
    fn visit_branch_node_enter(&mut self, node: ruby_prism::Node<'pr>) {
        self.enter(node);
    }

    fn visit_branch_node_leave(&mut self) {
        self.depth -= 1;
    }

    fn visit_leaf_node_enter(&mut self, node: ruby_prism::Node<'pr>) {
        self.enter(node);
    }

    fn visit_leaf_node_leave(&mut self) {
        self.depth -= 1;
    }
}
