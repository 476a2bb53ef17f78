//! SmartScript: text templates with embedded `{$ ... $}` tags.
//!
//! The pipeline runs leaves first:
//!
//! - [`lexer`] turns source text into [`token::Token`]s, in text or tag mode
//! - [`parser`] builds a [`node::Document`] and checks tag balance
//! - [`interp`] walks the document, using a [`stack::StackStore`] for loop
//!   variables and [`value::Value`] for arithmetic
//!
//! # Quick start
//!
//! ```rust
//! use smartscript::context::RequestContext;
//! use smartscript::script::{parse, Interpreter};
//!
//! let doc = parse("{$ FOR i 1 3 $}{$= i i * $} {$END$}").unwrap();
//! let mut ctx = RequestContext::buffered();
//! Interpreter::new().execute(&doc, &mut ctx).unwrap();
//! assert_eq!(ctx.output_str(), "1 4 9 ");
//! ```

pub mod builtins;
pub mod interp;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod stack;
pub mod token;
pub mod value;

// Re-exports for convenience.
pub use builtins::{Builtin, EvalStack, FunctionTable};
pub use interp::{ExecError, Interpreter};
pub use lexer::{LexError, Lexer, LexerState};
pub use node::{Document, ForLoop, Node};
pub use parser::{parse, ParseError};
pub use stack::{StackError, StackStore};
pub use token::{Element, Operator, Token};
pub use value::{Value, ValueError};
