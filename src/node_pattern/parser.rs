//! NodePattern DSL parser.
//!
//! Parses a token stream into a `PatternNode` tree. Captures are numbered in
//! the order they appear; the parser records each capture's name so the
//! matcher never has to carry strings around.

use super::PatternError;
use super::lexer::Token;
use crate::tree::Scalar;

/// Deepest nesting accepted. Both the parser and the matcher recurse once per
/// level, so this bounds their stack use.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum PatternNode {
    /// (head child1 child2 ...)
    Sequence {
        head: Box<PatternNode>,
        children: Vec<PatternNode>,
    },
    /// {a | b | c}
    Alternatives(Vec<PatternNode>),
    /// [a b c]
    Conjunction(Vec<PatternNode>),
    /// $pattern or $name=pattern
    Capture { slot: usize, inner: Box<PatternNode> },
    /// !pattern
    Negation(Box<PatternNode>),
    /// `pattern
    Descend(Box<PatternNode>),
    /// _
    Wildcard,
    /// ...
    Rest,
    /// `nil` or `nil?`: an absent child slot
    Nil,
    /// Bare identifier: node kind test
    Kind(String),
    /// :sym, 1, 1.5, "str"
    Literal(Scalar),
}

pub struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    capture_names: Vec<String>,
    positional: usize,
    depth: usize,
}

impl Parser {
    /// `end` is the input length, used to place "unexpected end" errors.
    pub fn new(tokens: Vec<(usize, Token)>, end: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
            capture_names: Vec::new(),
            positional: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(o, _)| *o)
    }

    fn error(&self, message: impl Into<String>) -> PatternError {
        PatternError::new(self.offset(), message)
    }

    /// Parse a whole pattern. Returns the root and the capture names by slot.
    pub fn parse(mut self) -> Result<(PatternNode, Vec<String>), PatternError> {
        if self.tokens.is_empty() {
            return Err(self.error("empty pattern"));
        }
        let root = self.parse_node(false)?;
        if self.pos < self.tokens.len() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok((root, self.capture_names))
    }

    fn capture_slot(&mut self, name: Option<String>) -> usize {
        let name = name.unwrap_or_else(|| {
            let n = self.positional.to_string();
            self.positional += 1;
            n
        });
        if let Some(slot) = self.capture_names.iter().position(|n| *n == name) {
            // Reused across alternative branches: `{$x=(int _) $x=(float _)}`
            return slot;
        }
        self.capture_names.push(name);
        self.capture_names.len() - 1
    }

    /// `in_sequence` is true only for child positions of `( ... )`, the one
    /// place a `...` rest is meaningful.
    fn parse_node(&mut self, in_sequence: bool) -> Result<PatternNode, PatternError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("pattern nested too deeply"));
        }
        self.depth += 1;
        let node = self.parse_term(in_sequence);
        self.depth -= 1;
        node
    }

    fn parse_term(&mut self, in_sequence: bool) -> Result<PatternNode, PatternError> {
        let Some(tok) = self.peek().cloned() else {
            return Err(self.error("unexpected end of pattern"));
        };

        match tok {
            Token::LParen => self.parse_sequence(),
            Token::LBrace => self.parse_alternatives(),
            Token::LBracket => self.parse_conjunction(),
            Token::Capture | Token::NamedCapture(_) => {
                self.pos += 1;
                let name = match tok {
                    Token::NamedCapture(name) => Some(name),
                    _ => None,
                };
                let slot = self.capture_slot(name);
                let inner = self.parse_node(in_sequence)?;
                Ok(PatternNode::Capture {
                    slot,
                    inner: Box::new(inner),
                })
            }
            Token::Negation => {
                self.pos += 1;
                let inner = self.parse_node(false)?;
                Ok(PatternNode::Negation(Box::new(inner)))
            }
            Token::Backtick => {
                self.pos += 1;
                let inner = self.parse_node(false)?;
                Ok(PatternNode::Descend(Box::new(inner)))
            }
            Token::Wildcard => {
                self.pos += 1;
                Ok(PatternNode::Wildcard)
            }
            Token::Rest => {
                if !in_sequence {
                    return Err(self.error("`...` is only allowed among sequence children"));
                }
                self.pos += 1;
                Ok(PatternNode::Rest)
            }
            Token::NilPredicate => {
                self.pos += 1;
                Ok(PatternNode::Nil)
            }
            Token::Ident(name) => {
                self.pos += 1;
                Ok(PatternNode::Kind(name))
            }
            Token::SymbolLiteral(name) => {
                self.pos += 1;
                Ok(PatternNode::Literal(Scalar::Symbol(name)))
            }
            Token::StringLiteral(s) => {
                self.pos += 1;
                Ok(PatternNode::Literal(Scalar::Str(s)))
            }
            Token::IntLiteral(n) => {
                self.pos += 1;
                Ok(PatternNode::Literal(Scalar::Int(n)))
            }
            Token::FloatLiteral(x) => {
                self.pos += 1;
                Ok(PatternNode::Literal(Scalar::Float(x)))
            }
            Token::Unsupported(op) => Err(self.error(format!("unsupported operator `{op}`"))),
            Token::RParen | Token::RBrace | Token::RBracket | Token::Pipe => {
                Err(self.error("unexpected closing delimiter"))
            }
        }
    }

    fn parse_sequence(&mut self) -> Result<PatternNode, PatternError> {
        self.pos += 1; // (
        if self.peek() == Some(&Token::RParen) {
            return Err(self.error("empty sequence `()`"));
        }
        let head = self.parse_node(false)?;

        let mut children = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RParen) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => children.push(self.parse_node(true)?),
                None => return Err(self.error("unclosed `(`")),
            }
        }

        Ok(PatternNode::Sequence {
            head: Box::new(head),
            children,
        })
    }

    fn parse_alternatives(&mut self) -> Result<PatternNode, PatternError> {
        self.pos += 1; // {
        let mut alts = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Pipe) => self.pos += 1,
                Some(_) => alts.push(self.parse_node(false)?),
                None => return Err(self.error("unclosed `{`")),
            }
        }
        if alts.is_empty() {
            return Err(self.error("empty alternatives `{}`"));
        }
        Ok(PatternNode::Alternatives(alts))
    }

    fn parse_conjunction(&mut self) -> Result<PatternNode, PatternError> {
        self.pos += 1; // [
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBracket) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => items.push(self.parse_node(false)?),
                None => return Err(self.error("unclosed `[`")),
            }
        }
        if items.is_empty() {
            return Err(self.error("empty conjunction `[]`"));
        }
        Ok(PatternNode::Conjunction(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_pattern::lexer::Lexer;

    fn parse(input: &str) -> Result<(PatternNode, Vec<String>), PatternError> {
        let tokens = Lexer::new(input).tokenize()?;
        Parser::new(tokens, input.len()).parse()
    }

    fn kind(name: &str) -> PatternNode {
        PatternNode::Kind(name.to_string())
    }

    fn sym(name: &str) -> PatternNode {
        PatternNode::Literal(Scalar::Symbol(name.to_string()))
    }

    #[test]
    fn test_parser_simple_send() {
        let (ast, captures) = parse("(send nil :expect ...)").unwrap();
        assert_eq!(
            ast,
            PatternNode::Sequence {
                head: Box::new(kind("send")),
                children: vec![PatternNode::Nil, sym("expect"), PatternNode::Rest],
            }
        );
        assert!(captures.is_empty());
    }

    #[test]
    fn test_parser_alternatives_with_and_without_pipes() {
        let (with, _) = parse("{:first | :take}").unwrap();
        let (without, _) = parse("{:first :take}").unwrap();
        assert_eq!(with, without);
        assert_eq!(with, PatternNode::Alternatives(vec![sym("first"), sym("take")]));
    }

    #[test]
    fn test_parser_nested() {
        let (ast, _) = parse("(send (send _ :where ...) :first)").unwrap();
        let PatternNode::Sequence { head, children } = ast else {
            panic!("Expected Sequence");
        };
        assert_eq!(*head, kind("send"));
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[0], PatternNode::Sequence { head, .. } if **head == kind("send")));
    }

    #[test]
    fn test_parser_alternative_head() {
        let (ast, _) = parse("({send csend} _ :foo)").unwrap();
        let PatternNode::Sequence { head, .. } = ast else {
            panic!("Expected Sequence");
        };
        assert_eq!(*head, PatternNode::Alternatives(vec![kind("send"), kind("csend")]));
    }

    #[test]
    fn test_parser_conjunction_and_negation() {
        let (ast, _) = parse("[!nil send_type?]").unwrap();
        assert_eq!(
            ast,
            PatternNode::Conjunction(vec![
                PatternNode::Negation(Box::new(PatternNode::Nil)),
                kind("send"),
            ])
        );
    }

    #[test]
    fn test_parser_positional_and_named_captures() {
        let (ast, names) = parse("(send $_ :to $eql=(send nil :eql $_))").unwrap();
        assert_eq!(names, vec!["0", "eql", "1"]);
        let PatternNode::Sequence { children, .. } = ast else {
            panic!("Expected Sequence");
        };
        assert!(matches!(&children[0], PatternNode::Capture { slot: 0, .. }));
        assert!(matches!(&children[2], PatternNode::Capture { slot: 1, .. }));
    }

    #[test]
    fn test_parser_named_capture_reused_across_branches() {
        let (_, names) = parse("{$v=(int _) $v=(float _)}").unwrap();
        assert_eq!(names, vec!["v"]);
    }

    #[test]
    fn test_parser_capture_rest() {
        let (ast, names) = parse("(send nil :foo $...)").unwrap();
        assert_eq!(names, vec!["0"]);
        let PatternNode::Sequence { children, .. } = ast else {
            panic!("Expected Sequence");
        };
        assert!(
            matches!(&children[2], PatternNode::Capture { inner, .. } if **inner == PatternNode::Rest)
        );
    }

    #[test]
    fn test_parser_literals() {
        let (ast, _) = parse("(foo 1 1.5 \"s\" :sym)").unwrap();
        let PatternNode::Sequence { children, .. } = ast else {
            panic!("Expected Sequence");
        };
        assert_eq!(
            children,
            vec![
                PatternNode::Literal(Scalar::Int(1)),
                PatternNode::Literal(Scalar::Float(1.5)),
                PatternNode::Literal(Scalar::Str("s".to_string())),
                sym("sym"),
            ]
        );
    }

    #[test]
    fn test_parser_descend() {
        let (ast, _) = parse("(block _ _ `(send nil :binding))").unwrap();
        let PatternNode::Sequence { children, .. } = ast else {
            panic!("Expected Sequence");
        };
        assert!(matches!(&children[2], PatternNode::Descend(_)));
    }

    #[test]
    fn test_parser_errors() {
        let cases = [
            ("", "empty pattern"),
            ("(send", "unclosed `(`"),
            ("{:a :b", "unclosed `{`"),
            ("[int", "unclosed `[`"),
            ("()", "empty sequence"),
            ("{}", "empty alternatives"),
            ("(send) _", "trailing input"),
            ("...", "only allowed among sequence children"),
            ("{... int}", "only allowed among sequence children"),
            ("(send ^_)", "unsupported operator `^`"),
            ("(send #foo?)", "unsupported operator `#foo?`"),
            ("(send %1)", "unsupported operator `%1`"),
            (")", "unexpected closing delimiter"),
            ("!", "unexpected end"),
        ];
        for (input, expected) in cases {
            let err = parse(input).unwrap_err();
            assert!(
                err.message.contains(expected),
                "{input:?}: expected {expected:?}, got {:?}",
                err.message
            );
        }
    }

    #[test]
    fn test_parser_error_offset_points_at_token() {
        let err = parse("(send _ ^x)").unwrap_err();
        assert_eq!(err.offset, 8);
        let err = parse("(send").unwrap_err();
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn test_parser_rejects_deep_nesting() {
        let deep = format!("{}send{}", "(".repeat(1000), ")".repeat(1000));
        let err = parse(&deep).unwrap_err();
        assert_eq!(err.message, "pattern nested too deeply");
        assert_eq!(err.offset, MAX_DEPTH);

        let negations = format!("{}_", "!".repeat(10_000));
        let err = parse(&negations).unwrap_err();
        assert_eq!(err.message, "pattern nested too deeply");

        let alternatives = format!("{}int{}", "{".repeat(500), "}".repeat(500));
        assert!(parse(&alternatives).is_err());
    }

    #[test]
    fn test_parser_accepts_nesting_up_to_limit() {
        let depth = MAX_DEPTH;
        let ok = format!("{}send{}", "(".repeat(depth - 1), ")".repeat(depth - 1));
        assert!(parse(&ok).is_ok());
        let too_deep = format!("{}send{}", "(".repeat(depth), ")".repeat(depth));
        assert!(parse(&too_deep).is_err());
    }
}
