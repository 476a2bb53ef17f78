//! SmartScript lexer.
//!
//! The lexer has two modes and the consumer switches between them with
//! [`Lexer::set_state`]:
//!
//! - [`LexerState::Text`] collects everything up to the next `{$` into one
//!   [`Token::Text`].  `\{` and `\\` are the only escapes.
//! - [`LexerState::Tag`] skips whitespace and yields one tag-body token per
//!   call: `$}`, strings, `@functions`, numbers, identifiers and operators.
//!
//! The first token after `{$` is special: `=` and the words `for`/`end` (any
//! case) come out as [`Token::TagName`].

use thiserror::Error;

use super::token::{Operator, Token};

/// A fatal lexing failure.  Offsets are byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("invalid escape `\\{found}` in text at offset {offset}")]
    InvalidTextEscape { offset: usize, found: char },
    #[error("backslash at end of input (offset {offset})")]
    DanglingEscape { offset: usize },
    #[error("invalid escape `\\{found}` in string literal at offset {offset}")]
    InvalidStringEscape { offset: usize, found: char },
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("`@` at offset {offset} must be followed by a letter")]
    InvalidFunctionName { offset: usize },
    #[error("number `{literal}` at offset {offset} is out of range")]
    NumberOutOfRange { offset: usize, literal: String },
    #[error("unexpected character `{found}` at offset {offset}")]
    UnexpectedChar { offset: usize, found: char },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerState {
    #[default]
    Text,
    Tag,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    state: LexerState,
    /// Set after `{$` until the next tag-mode token has been produced.
    at_tag_start: bool,
    token: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            pos: 0,
            state: LexerState::Text,
            at_tag_start: false,
            token: None,
        }
    }

    pub fn state(&self) -> LexerState {
        self.state
    }

    pub fn set_state(&mut self, state: LexerState) {
        self.state = state;
    }

    /// The most recently produced token.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Byte offset of the next unread character.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Produce the next token in the current mode.
    ///
    /// Once the input is exhausted every further call yields [`Token::Eof`].
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let token = match self.state {
            LexerState::Text => self.next_text()?,
            LexerState::Tag => self.next_tag()?,
        };
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Tokenize a whole input, switching modes the way the parser does.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token()?;
            match t {
                Token::Eof => {
                    tokens.push(t);
                    return Ok(tokens);
                }
                Token::TagOpen => self.set_state(LexerState::Tag),
                Token::TagClose => self.set_state(LexerState::Text),
                _ => {}
            }
            tokens.push(t);
        }
    }

    // ── Character access ──────────────────────────────────────────────────────

    fn rest(&self) -> &'a str {
        let src: &'a str = self.src;
        &src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek2(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    // ── Text mode ─────────────────────────────────────────────────────────────

    fn next_text(&mut self) -> Result<Token, LexError> {
        if self.rest().starts_with("{$") {
            self.pos += 2;
            self.at_tag_start = true;
            return Ok(Token::TagOpen);
        }
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if self.rest().starts_with("{$") {
                break;
            }
            let offset = self.pos;
            self.advance();
            if c != '\\' {
                text.push(c);
                continue;
            }
            match self.advance() {
                Some(escaped @ ('{' | '\\')) => text.push(escaped),
                Some(found) => return Err(LexError::InvalidTextEscape { offset, found }),
                None => return Err(LexError::DanglingEscape { offset }),
            }
        }
        if text.is_empty() {
            Ok(Token::Eof)
        } else {
            Ok(Token::Text(text))
        }
    }

    // ── Tag mode ──────────────────────────────────────────────────────────────

    fn next_tag(&mut self) -> Result<Token, LexError> {
        self.skip_ws();
        let offset = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        if std::mem::take(&mut self.at_tag_start) {
            if c == '=' {
                self.advance();
                return Ok(Token::TagName("=".into()));
            }
            if c.is_alphabetic() {
                let word = self.read_word();
                let lower = word.to_ascii_lowercase();
                return Ok(match lower.as_str() {
                    "for" | "end" => Token::TagName(lower),
                    _ => Token::Ident(word),
                });
            }
        }

        if self.rest().starts_with("$}") {
            self.pos += 2;
            return Ok(Token::TagClose);
        }

        match c {
            '"' => {
                self.advance();
                self.read_string(offset)
            }
            '@' => {
                self.advance();
                if !self.peek().is_some_and(char::is_alphabetic) {
                    return Err(LexError::InvalidFunctionName { offset });
                }
                Ok(Token::Function(self.read_word()))
            }
            '0'..='9' => self.read_number(offset),
            '-' if self.peek2().is_some_and(|d| d.is_ascii_digit()) => self.read_number(offset),
            c if c.is_alphabetic() => Ok(Token::Ident(self.read_word())),
            c => match Operator::from_char(c) {
                Some(op) => {
                    self.advance();
                    Ok(Token::Operator(op))
                }
                None => Err(LexError::UnexpectedChar { offset, found: c }),
            },
        }
    }

    /// Letters, digits and underscores.  The caller has checked the first
    /// character is a letter.
    fn read_word(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        self.src[start..self.pos].to_owned()
    }

    fn read_number(&mut self, offset: usize) -> Result<Token, LexError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let mut is_real = false;
        if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
            is_real = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        let literal = &self.src[start..self.pos];
        let out_of_range = || LexError::NumberOutOfRange {
            offset,
            literal: literal.to_owned(),
        };
        if is_real {
            match literal.parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Token::Real(x)),
                _ => Err(out_of_range()),
            }
        } else {
            literal.parse::<i32>().map(Token::Int).map_err(|_| out_of_range())
        }
    }

    /// Read the rest of a string literal; the opening `"` is consumed.
    fn read_string(&mut self, offset: usize) -> Result<Token, LexError> {
        let mut s = String::new();
        loop {
            let escape_at = self.pos;
            match self.advance() {
                None => return Err(LexError::UnterminatedString { offset }),
                Some('"') => return Ok(Token::Str(s)),
                Some('\\') => match self.advance() {
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some('n') => s.push('\n'),
                    Some('r') => s.push('\r'),
                    Some('t') => s.push('\t'),
                    Some(found) => {
                        return Err(LexError::InvalidStringEscape {
                            offset: escape_at,
                            found,
                        })
                    }
                    None => return Err(LexError::UnterminatedString { offset }),
                },
                Some(c) => s.push(c),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
