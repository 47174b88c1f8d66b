//! NodePattern DSL lexer.
//!
//! Tokenizes pattern strings like `(send nil :expect ...)`. Every token
//! carries the byte offset it started at so the parser can point at it.

use super::PatternError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Capture,  // $
    /// `$name=` prefix of a named capture
    NamedCapture(String),
    Wildcard, // _
    Rest,     // ...
    Negation, // !
    Pipe,     // | inside alternatives
    Backtick, // ` (descend operator)
    SymbolLiteral(String),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    NilPredicate, // nil? / nil
    /// Node kind names: send, block, int. `int?` and `int_type?` lex to `int`.
    Ident(String),
    /// Operators the matcher has no use for (`^`, `#helper`, `%1`). Kept as
    /// tokens so the parser can reject them with a precise message.
    Unsupported(String),
}

pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.pos + ahead).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.pos < self.input.len() && pred(self.input[self.pos]) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn is_ident_char(ch: u8) -> bool {
        ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'-'
    }

    /// `$name=` lookahead. Returns the name and the offset just past `=`.
    fn named_capture_ahead(&self) -> Option<(String, usize)> {
        let start = self.pos + 1;
        let mut end = start;
        while end < self.input.len()
            && (self.input[end].is_ascii_alphanumeric() || self.input[end] == b'_')
        {
            end += 1;
        }
        if end > start && self.input.get(end) == Some(&b'=') {
            let name = String::from_utf8_lossy(&self.input[start..end]).into_owned();
            Some((name, end + 1))
        } else {
            None
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<(usize, Token)>, PatternError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(ch) = self.peek() else { break };

            let token = match ch {
                b'(' => {
                    self.pos += 1;
                    Token::LParen
                }
                b')' => {
                    self.pos += 1;
                    Token::RParen
                }
                b'{' => {
                    self.pos += 1;
                    Token::LBrace
                }
                b'}' => {
                    self.pos += 1;
                    Token::RBrace
                }
                b'[' => {
                    self.pos += 1;
                    Token::LBracket
                }
                b']' => {
                    self.pos += 1;
                    Token::RBracket
                }
                b'$' => match self.named_capture_ahead() {
                    Some((name, next)) => {
                        self.pos = next;
                        Token::NamedCapture(name)
                    }
                    None => {
                        self.pos += 1;
                        Token::Capture
                    }
                },
                b'|' => {
                    self.pos += 1;
                    Token::Pipe
                }
                b'`' => {
                    self.pos += 1;
                    Token::Backtick
                }
                b'!' => {
                    self.pos += 1;
                    Token::Negation
                }
                b'^' => {
                    self.pos += 1;
                    Token::Unsupported("^".to_string())
                }
                b'.' => {
                    if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                        self.pos += 3;
                        Token::Rest
                    } else {
                        return Err(PatternError::new(start, "expected `...`"));
                    }
                }
                b'#' => {
                    self.pos += 1;
                    let name = self.read_while(|c| Self::is_ident_char(c) || c == b'?');
                    Token::Unsupported(format!("#{name}"))
                }
                b'%' => {
                    self.pos += 1;
                    let param = self.read_while(|c| c.is_ascii_alphanumeric() || c == b'_');
                    Token::Unsupported(format!("%{param}"))
                }
                b':' => {
                    self.pos += 1;
                    // Operator method names: :==, :<=>, :[]=, :+, :!, ...
                    let name = if self
                        .peek()
                        .is_some_and(|c| b"=<>!~+*&|^/%-.[".contains(&c))
                    {
                        self.read_while(|c| b"=<>!~+*&|^/%-.[]".contains(&c))
                    } else {
                        self.read_while(|c| {
                            c.is_ascii_alphanumeric() || c == b'_' || c == b'?' || c == b'!' || c == b'='
                        })
                    };
                    if name.is_empty() {
                        return Err(PatternError::new(start, "empty symbol literal"));
                    }
                    Token::SymbolLiteral(name)
                }
                b'\'' | b'"' => {
                    let quote = ch;
                    self.pos += 1;
                    let s = self.read_while(move |c| c != quote);
                    if self.peek() != Some(quote) {
                        return Err(PatternError::new(start, "unterminated string literal"));
                    }
                    self.pos += 1;
                    Token::StringLiteral(s)
                }
                b'_' => {
                    let word = self.read_while(|c| Self::is_ident_char(c) || c == b'?');
                    if word == "_" {
                        Token::Wildcard
                    } else {
                        Token::Ident(word)
                    }
                }
                _ if ch.is_ascii_digit()
                    || (ch == b'-' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())) =>
                {
                    self.pos += 1;
                    let rest = self.read_while(|c| c.is_ascii_digit() || c == b'.' || c == b'_');
                    let num_str: String = std::iter::once(ch as char)
                        .chain(rest.chars())
                        .filter(|c| *c != '_')
                        .collect();
                    if num_str.contains('.') {
                        match num_str.parse::<f64>() {
                            Ok(x) => Token::FloatLiteral(x),
                            Err(_) => {
                                return Err(PatternError::new(
                                    start,
                                    format!("invalid float literal `{num_str}`"),
                                ));
                            }
                        }
                    } else {
                        match num_str.parse::<i64>() {
                            Ok(n) => Token::IntLiteral(n),
                            Err(_) => {
                                return Err(PatternError::new(
                                    start,
                                    format!("invalid integer literal `{num_str}`"),
                                ));
                            }
                        }
                    }
                }
                _ if ch.is_ascii_alphabetic() => {
                    let word = self.read_while(|c| Self::is_ident_char(c) || c == b'?');
                    match word.as_str() {
                        "nil" | "nil?" => Token::NilPredicate,
                        _ => {
                            let kind = word
                                .strip_suffix("_type?")
                                .or_else(|| word.strip_suffix('?'))
                                .unwrap_or(&word);
                            Token::Ident(kind.to_string())
                        }
                    }
                }
                _ => {
                    let shown = String::from_utf8_lossy(&self.input[start..])
                        .chars()
                        .next()
                        .unwrap_or('?');
                    return Err(PatternError::new(
                        start,
                        format!("unexpected character `{shown}`"),
                    ));
                }
            };
            tokens.push((start, token));
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|(_, t)| t)
            .collect()
    }

    #[test]
    fn test_lexer_basic() {
        let tokens = lex("(send nil? :expect ...)");
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Ident("send".to_string()),
                Token::NilPredicate,
                Token::SymbolLiteral("expect".to_string()),
                Token::Rest,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_lexer_bare_nil_is_absent() {
        assert_eq!(lex("nil"), vec![Token::NilPredicate]);
    }

    #[test]
    fn test_lexer_alternatives() {
        let tokens = lex("{:first | :take}");
        assert_eq!(
            tokens,
            vec![
                Token::LBrace,
                Token::SymbolLiteral("first".to_string()),
                Token::Pipe,
                Token::SymbolLiteral("take".to_string()),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_lexer_capture() {
        assert_eq!(lex("$_"), vec![Token::Capture, Token::Wildcard]);
    }

    #[test]
    fn test_lexer_named_capture() {
        assert_eq!(
            lex("$eql=(send)"),
            vec![
                Token::NamedCapture("eql".to_string()),
                Token::LParen,
                Token::Ident("send".to_string()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_lexer_capture_of_predicate_is_not_named() {
        assert_eq!(
            lex("$int?"),
            vec![Token::Capture, Token::Ident("int".to_string())]
        );
    }

    #[test]
    fn test_lexer_type_predicates_become_kinds() {
        assert_eq!(lex("int?"), vec![Token::Ident("int".to_string())]);
        assert_eq!(lex("send_type?"), vec![Token::Ident("send".to_string())]);
    }

    #[test]
    fn test_lexer_operator_symbols() {
        assert_eq!(lex(":=="), vec![Token::SymbolLiteral("==".to_string())]);
        assert_eq!(lex(":[]="), vec![Token::SymbolLiteral("[]=".to_string())]);
        assert_eq!(lex(":empty?"), vec![Token::SymbolLiteral("empty?".to_string())]);
    }

    #[test]
    fn test_lexer_numbers() {
        assert_eq!(lex("42"), vec![Token::IntLiteral(42)]);
        assert_eq!(lex("-1"), vec![Token::IntLiteral(-1)]);
        assert_eq!(lex("1_000"), vec![Token::IntLiteral(1000)]);
        assert_eq!(lex("1.5"), vec![Token::FloatLiteral(1.5)]);
    }

    #[test]
    fn test_lexer_string_literal() {
        assert_eq!(
            lex("'hello' \"x\""),
            vec![
                Token::StringLiteral("hello".to_string()),
                Token::StringLiteral("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_lexer_unsupported_operators() {
        assert_eq!(
            lex("^ #expect? %1"),
            vec![
                Token::Unsupported("^".to_string()),
                Token::Unsupported("#expect?".to_string()),
                Token::Unsupported("%1".to_string()),
            ]
        );
    }

    #[test]
    fn test_lexer_offsets() {
        let tokens = Lexer::new("(send  _)").tokenize().unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, vec![0, 1, 7, 8]);
    }

    #[test]
    fn test_lexer_errors() {
        let err = Lexer::new("(send @)").tokenize().unwrap_err();
        assert_eq!(err.offset, 6);
        assert!(err.message.contains("unexpected character"));

        let err = Lexer::new("'open").tokenize().unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.message.contains("unterminated"));

        assert!(Lexer::new("(send ..)").tokenize().is_err());
        assert!(Lexer::new(": ").tokenize().is_err());
    }
}
