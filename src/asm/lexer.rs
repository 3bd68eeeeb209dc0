//! Tokenizer for micro0 assembly.

use crate::asm::assembler::AssemblerError;
use std::fmt;

/// A position in the source text (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `.org`
    Org,
    Ident(String),
    Number(u32),
    LBracket,
    RBracket,
    Colon,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Org => write!(f, "`.org`"),
            TokenKind::Ident(name) => write!(f, "`{}`", name),
            TokenKind::Number(n) => write!(f, "number {:#x}", n),
            TokenKind::LBracket => write!(f, "`[`"),
            TokenKind::RBracket => write!(f, "`]`"),
            TokenKind::Colon => write!(f, "`:`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

/// Split `source` into tokens, dropping whitespace and comments.
///
/// Comments run from `;` to the end of the line, or between `/*` and `*/`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, AssemblerError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1, column: 1 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn skip_trivia(&mut self) -> Result<(), AssemblerError> {
        loop {
            if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else if self.rest().starts_with(';') {
                self.take_while(|c| c != '\n');
            } else if self.rest().starts_with("/*") {
                let start = self.location();
                self.bump();
                self.bump();
                loop {
                    if self.rest().starts_with("*/") {
                        self.bump();
                        self.bump();
                        break;
                    }
                    if self.bump().is_none() {
                        return Err(parse_error(start, "unterminated block comment"));
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, AssemblerError> {
        self.skip_trivia()?;

        let location = self.location();
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            '[' => {
                self.bump();
                TokenKind::LBracket
            }
            ']' => {
                self.bump();
                TokenKind::RBracket
            }
            ':' => {
                self.bump();
                TokenKind::Colon
            }
            '.' => {
                self.bump();
                let name = self.take_while(is_ident_char);
                if name.eq_ignore_ascii_case("org") {
                    TokenKind::Org
                } else {
                    return Err(parse_error(location, format!("unknown directive `.{}`", name)));
                }
            }
            c if c.is_ascii_digit() => self.number(location)?,
            c if is_ident_start(c) => TokenKind::Ident(self.take_while(is_ident_char).to_string()),
            other => {
                return Err(parse_error(location, format!("unexpected character `{}`", other)));
            }
        };

        Ok(Some(Token { kind, location }))
    }

    fn number(&mut self, location: Location) -> Result<TokenKind, AssemblerError> {
        let rest = self.rest();
        let (digits, radix) = if rest.starts_with("0x") || rest.starts_with("0X") {
            self.bump();
            self.bump();
            (self.take_while(|c| c.is_ascii_hexdigit()), 16)
        } else {
            (self.take_while(|c| c.is_ascii_digit()), 10)
        };

        if digits.is_empty() || self.peek().is_some_and(is_ident_char) {
            return Err(parse_error(location, "malformed number literal"));
        }

        u32::from_str_radix(digits, radix)
            .map(TokenKind::Number)
            .map_err(|_| parse_error(location, "number literal too large"))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub(crate) fn parse_error(location: Location, message: impl Into<String>) -> AssemblerError {
    AssemblerError::Parse {
        location,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_instruction() {
        assert_eq!(
            kinds("loop: load [0x1234]"),
            vec![
                TokenKind::Ident("loop".into()),
                TokenKind::Colon,
                TokenKind::Ident("load".into()),
                TokenKind::LBracket,
                TokenKind::Number(0x1234),
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "; header\n.org 0x0 /* block\n comment */ db 12 ; trailing";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Org,
                TokenKind::Number(0),
                TokenKind::Ident("db".into()),
                TokenKind::Number(12),
            ]
        );
    }

    #[test]
    fn test_locations() {
        let tokens = tokenize("\n   store [x]").unwrap();
        assert_eq!(tokens[0].location, Location::new(2, 4));
        assert_eq!(tokens[1].location, Location::new(2, 10));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize(".org 0x0 /* never closed").unwrap_err();
        assert!(matches!(
            err,
            AssemblerError::Parse { location, .. } if location == Location::new(1, 10)
        ));
    }

    #[test]
    fn test_bad_literals() {
        assert!(tokenize("0x").is_err());
        assert!(tokenize("12ab").is_err());
        assert!(tokenize("0xFFFFFFFFFF").is_err());
        assert!(tokenize(".data").is_err());
        assert!(tokenize("load $10").is_err());
    }
}
