//! A small templating engine: literal text interleaved with `{$= ... $}`
//! echo tags and `{$ FOR ... $}` loops.
//!
//! ```rust
//! let mut ctx = smartscript::RequestContext::buffered().with_parameter("who", "world");
//! smartscript::render("Hello, {$= who $}!", &mut ctx).unwrap();
//! assert_eq!(ctx.output_str(), "Hello, world!");
//! ```

pub mod config;
pub mod context;
pub mod script;

use thiserror::Error;

pub use config::{ConfigError, EngineConfig};
pub use context::{RenderContext, RequestContext};
pub use script::{parse, Document, ExecError, Interpreter, ParseError};

/// Any failure of [`render`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("execution error: {0}")]
    Exec(#[from] ExecError),
}

/// Parse `src` and execute it once with a default [`Interpreter`].
///
/// Nothing is written to `ctx` if parsing fails.
pub fn render(src: &str, ctx: &mut dyn RenderContext) -> Result<(), Error> {
    let doc = parse(src)?;
    Interpreter::new().execute(&doc, ctx)?;
    Ok(())
}
