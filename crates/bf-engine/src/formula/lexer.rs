//! Formula tokenizer.
//!
//! Only digits, whitespace, identifiers and the operator characters
//! `+ - * / ( ) > = < ? : & | ! .` are accepted. Anything else is rejected
//! before parsing starts.

use super::FormulaError;

/// A token with its byte offset in the formula.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Token types
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Ident(String),

    Plus,       // +
    Minus,      // -
    Star,       // *
    DoubleStar, // **
    Slash,      // /
    LParen,     // (
    RParen,     // )
    Lt,         // <
    Le,         // <=
    Gt,         // >
    Ge,         // >=
    Eq,         // ==
    StrictEq,   // ===
    Ne,         // !=
    StrictNe,   // !==
    Not,        // !
    And,        // &&
    Or,         // ||
    Question,   // ?
    Colon,      // :
}

impl TokenKind {
    /// Source spelling, for error messages.
    pub(crate) fn describe(&self) -> String {
        let symbol = match self {
            Self::Number(n) => return n.to_string(),
            Self::Ident(name) => return name.clone(),
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::DoubleStar => "**",
            Self::Slash => "/",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::StrictEq => "===",
            Self::Ne => "!=",
            Self::StrictNe => "!==",
            Self::Not => "!",
            Self::And => "&&",
            Self::Or => "||",
            Self::Question => "?",
            Self::Colon => ":",
        };
        symbol.to_owned()
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Tokenize a formula.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn run(mut self) -> Result<Vec<Token>, FormulaError> {
        while let Some(c) = self.peek() {
            let offset = self.pos;

            if c.is_whitespace() {
                self.pos += c.len_utf8();
                continue;
            }

            let kind = if c.is_ascii_digit()
                || (c == '.' && self.peek_second().is_some_and(|d| d.is_ascii_digit()))
            {
                self.number()?
            } else if is_ident_start(c) {
                self.ident()
            } else {
                self.operator(c)?
            };

            self.tokens.push(Token { kind, offset });
        }

        Ok(self.tokens)
    }

    fn number(&mut self) -> Result<TokenKind, FormulaError> {
        let start = self.pos;
        let mut seen_dot = false;
        for c in self.rest().chars() {
            match c {
                '0'..='9' => {}
                '.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            self.pos += 1;
        }

        let literal = &self.source[start..self.pos];
        literal
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| FormulaError::InvalidNumber {
                literal: literal.to_owned(),
                offset: start,
            })
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !is_ident_continue(c))
            .unwrap_or(self.rest().len());
        self.pos += len;
        TokenKind::Ident(self.source[start..self.pos].to_owned())
    }

    fn operator(&mut self, c: char) -> Result<TokenKind, FormulaError> {
        let rest = self.rest();
        let (kind, len) = match c {
            '+' => (TokenKind::Plus, 1),
            '-' => (TokenKind::Minus, 1),
            '*' if rest.starts_with("**") => (TokenKind::DoubleStar, 2),
            '*' => (TokenKind::Star, 1),
            '/' => (TokenKind::Slash, 1),
            '(' => (TokenKind::LParen, 1),
            ')' => (TokenKind::RParen, 1),
            '<' if rest.starts_with("<=") => (TokenKind::Le, 2),
            '<' => (TokenKind::Lt, 1),
            '>' if rest.starts_with(">=") => (TokenKind::Ge, 2),
            '>' => (TokenKind::Gt, 1),
            '=' if rest.starts_with("===") => (TokenKind::StrictEq, 3),
            '=' if rest.starts_with("==") => (TokenKind::Eq, 2),
            '!' if rest.starts_with("!==") => (TokenKind::StrictNe, 3),
            '!' if rest.starts_with("!=") => (TokenKind::Ne, 2),
            '!' => (TokenKind::Not, 1),
            '&' if rest.starts_with("&&") => (TokenKind::And, 2),
            '|' if rest.starts_with("||") => (TokenKind::Or, 2),
            '?' => (TokenKind::Question, 1),
            ':' => (TokenKind::Colon, 1),
            '=' | '&' | '|' => {
                return Err(FormulaError::UnsupportedOperator {
                    operator: c,
                    offset: self.pos,
                });
            }
            _ => {
                return Err(FormulaError::DisallowedCharacter {
                    character: c,
                    offset: self.pos,
                });
            }
        };
        self.pos += len;
        Ok(kind)
    }
}
