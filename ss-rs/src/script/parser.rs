//! Recursive-descent parser for SmartScript.
//!
//! The parser pulls tokens from a [`Lexer`], switching it into tag mode after
//! every `{$` and back into text mode after every `$}`.  Open `FOR` tags are
//! kept on an explicit stack; an `END` tag pops the innermost one and attaches
//! it to its parent.  A parse either yields a complete [`Document`] or an
//! error, never a partial tree.

use thiserror::Error;
use tracing::{debug, trace};

use super::{
    lexer::{LexError, Lexer, LexerState},
    node::{Document, ForLoop, Node},
    token::{Element, Token},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("unknown tag `{0}`")]
    UnknownTag(String),
    #[error("expected {expected}, found {found}")]
    Unexpected { expected: &'static str, found: String },
    #[error("`FOR` {position} must be a variable, integer or string, found {found}")]
    InvalidForElement { position: &'static str, found: String },
    #[error("echo tag has no elements")]
    EmptyEcho,
    #[error("`END` tag without a matching `FOR`")]
    UnmatchedEnd,
    #[error("{0} `FOR` tag(s) not closed by `END` at end of input")]
    UnclosedFor(usize),
}

/// Parse a complete script.
pub fn parse(src: &str) -> Result<Document, ParseError> {
    Parser::new(src).parse()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Open `FOR` tags, innermost last.  The document root sits below them
    /// in `root`.
    open: Vec<ForLoop>,
    root: Vec<Node>,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(src),
            open: Vec::new(),
            root: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<Document, ParseError> {
        loop {
            match self.lexer.next_token()? {
                Token::Eof => break,
                Token::Text(text) => self.append(Node::Text(text)),
                Token::TagOpen => self.parse_tag()?,
                other => {
                    return Err(ParseError::Unexpected {
                        expected: "text or `{$`",
                        found: other.to_string(),
                    })
                }
            }
        }
        if !self.open.is_empty() {
            return Err(ParseError::UnclosedFor(self.open.len()));
        }
        let doc = Document::new(self.root);
        debug!(nodes = doc.node_count(), "parsed document");
        Ok(doc)
    }

    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.body.push(node),
            None => self.root.push(node),
        }
    }

    /// Read the next tag-mode token.
    fn next(&mut self) -> Result<Token, ParseError> {
        Ok(self.lexer.next_token()?)
    }

    // ── Tags ──────────────────────────────────────────────────────────────────

    fn parse_tag(&mut self) -> Result<(), ParseError> {
        self.lexer.set_state(LexerState::Tag);
        let name = match self.next()? {
            Token::TagName(name) => name,
            Token::Ident(name) => return Err(ParseError::UnknownTag(name)),
            other @ (Token::Eof | Token::TagClose) => {
                return Err(ParseError::Unexpected {
                    expected: "tag name",
                    found: other.to_string(),
                })
            }
            other => return Err(ParseError::UnknownTag(other.to_string())),
        };
        trace!(tag = %name, offset = self.lexer.offset(), "parsing tag");
        match name.as_str() {
            "for" => self.parse_for()?,
            "=" => self.parse_echo()?,
            "end" => self.parse_end()?,
            _ => return Err(ParseError::UnknownTag(name)),
        }
        self.lexer.set_state(LexerState::Text);
        Ok(())
    }

    fn parse_for(&mut self) -> Result<(), ParseError> {
        let variable = match self.next()? {
            Token::Ident(name) => name,
            other => {
                return Err(ParseError::Unexpected {
                    expected: "loop variable name",
                    found: other.to_string(),
                })
            }
        };
        let start = self.for_element("start")?;
        let end = self.for_element("end")?;
        let step = match self.next()? {
            Token::TagClose => None,
            token => {
                let step = for_element(token, "step")?;
                self.expect_close()?;
                Some(step)
            }
        };
        self.open.push(ForLoop {
            variable,
            start,
            end,
            step,
            body: Vec::new(),
        });
        Ok(())
    }

    fn for_element(&mut self, position: &'static str) -> Result<Element, ParseError> {
        let token = self.next()?;
        for_element(token, position)
    }

    fn parse_echo(&mut self) -> Result<(), ParseError> {
        let mut elements = Vec::new();
        loop {
            let element = match self.next()? {
                Token::TagClose => break,
                Token::Ident(name) => Element::Variable(name),
                Token::Function(name) => Element::Function(name),
                Token::Operator(op) => Element::Operator(op),
                Token::Str(s) => Element::Str(s),
                Token::Int(n) => Element::Int(n),
                Token::Real(x) => Element::Real(x),
                other => {
                    return Err(ParseError::Unexpected {
                        expected: "echo element or `$}`",
                        found: other.to_string(),
                    })
                }
            };
            elements.push(element);
        }
        if elements.is_empty() {
            return Err(ParseError::EmptyEcho);
        }
        self.append(Node::Echo(elements));
        Ok(())
    }

    fn parse_end(&mut self) -> Result<(), ParseError> {
        self.expect_close()?;
        let closed = self.open.pop().ok_or(ParseError::UnmatchedEnd)?;
        self.append(Node::For(closed));
        Ok(())
    }

    fn expect_close(&mut self) -> Result<(), ParseError> {
        match self.next()? {
            Token::TagClose => Ok(()),
            other => Err(ParseError::Unexpected {
                expected: "`$}`",
                found: other.to_string(),
            }),
        }
    }
}

fn for_element(token: Token, position: &'static str) -> Result<Element, ParseError> {
    match token {
        Token::Ident(name) => Ok(Element::Variable(name)),
        Token::Int(n) => Ok(Element::Int(n)),
        Token::Str(s) => Ok(Element::Str(s)),
        other => Err(ParseError::InvalidForElement {
            position,
            found: other.to_string(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
