//! Lexer tokens and the expression elements built from them.

use std::fmt;

// ── Token ─────────────────────────────────────────────────────────────────────

/// A token produced by [`Lexer`](super::lexer::Lexer).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Eof,
    /// A run of literal text with escapes already resolved.
    Text(String),
    /// `{$`
    TagOpen,
    /// `$}`
    TagClose,
    /// The construct name right after `{$`: `for`, `end` or `=`.
    TagName(String),
    Ident(String),
    Int(i32),
    Real(f64),
    /// A quoted string with escapes already resolved.
    Str(String),
    /// `@name`; the payload excludes the `@`.
    Function(String),
    Operator(Operator),
}

/// Payload-free classification of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Text,
    TagOpen,
    TagClose,
    TagName,
    Ident,
    Int,
    Real,
    Str,
    Function,
    Operator,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Eof => TokenKind::Eof,
            Token::Text(_) => TokenKind::Text,
            Token::TagOpen => TokenKind::TagOpen,
            Token::TagClose => TokenKind::TagClose,
            Token::TagName(_) => TokenKind::TagName,
            Token::Ident(_) => TokenKind::Ident,
            Token::Int(_) => TokenKind::Int,
            Token::Real(_) => TokenKind::Real,
            Token::Str(_) => TokenKind::Str,
            Token::Function(_) => TokenKind::Function,
            Token::Operator(_) => TokenKind::Operator,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => f.write_str("end of input"),
            Token::Text(s) => write!(f, "text {s:?}"),
            Token::TagOpen => f.write_str("`{$`"),
            Token::TagClose => f.write_str("`$}`"),
            Token::TagName(name) => write!(f, "tag name `{name}`"),
            Token::Ident(name) => write!(f, "identifier `{name}`"),
            Token::Int(n) => write!(f, "integer {n}"),
            Token::Real(x) => write!(f, "real {x}"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::Function(name) => write!(f, "function `@{name}`"),
            Token::Operator(op) => write!(f, "operator `{op}`"),
        }
    }
}

// ── Operator ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '+' => Operator::Add,
            '-' => Operator::Sub,
            '*' => Operator::Mul,
            '/' => Operator::Div,
            '^' => Operator::Pow,
            _ => return None,
        })
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Pow => '^',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ── Element ───────────────────────────────────────────────────────────────────

/// One item of a tag body.
///
/// The `Display` impl writes the element back in source form, so that the
/// output lexes to an equal element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Variable(String),
    Function(String),
    Operator(Operator),
    Str(String),
    Int(i32),
    Real(f64),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Variable(name) => f.write_str(name),
            Element::Function(name) => write!(f, "@{name}"),
            Element::Operator(op) => write!(f, "{op}"),
            Element::Str(s) => write_quoted(f, s),
            Element::Int(n) => write!(f, "{n}"),
            Element::Real(x) => {
                // f64's Display never uses exponent notation.
                let s = x.to_string();
                if s.contains('.') {
                    f.write_str(&s)
                } else {
                    write!(f, "{s}.0")
                }
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
