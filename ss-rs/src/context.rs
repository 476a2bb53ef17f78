//! Output side of script execution.
//!
//! The interpreter writes text through a [`RenderContext`] and reads request
//! parameters from it.  Persistent and temporary parameters are only touched
//! by built-in functions; the interpreter itself passes them through.

use std::collections::HashMap;
use std::io::{self, Write};

/// Everything a running script may observe or affect outside itself.
pub trait RenderContext {
    /// Append text to the output.
    fn write_str(&mut self, text: &str) -> io::Result<()>;

    fn mime_type(&self) -> &str;
    fn set_mime_type(&mut self, mime: &str);

    /// Read-only request parameter.
    fn parameter(&self, name: &str) -> Option<&str>;

    fn persistent_parameter(&self, name: &str) -> Option<&str>;
    fn set_persistent_parameter(&mut self, name: &str, value: String);
    fn remove_persistent_parameter(&mut self, name: &str);

    fn temporary_parameter(&self, name: &str) -> Option<&str>;
    fn set_temporary_parameter(&mut self, name: &str, value: String);
    fn remove_temporary_parameter(&mut self, name: &str);
}

/// A [`RenderContext`] writing to any [`io::Write`].
#[derive(Debug)]
pub struct RequestContext<W = Vec<u8>> {
    output: W,
    mime_type: String,
    parameters: HashMap<String, String>,
    persistent: HashMap<String, String>,
    temporary: HashMap<String, String>,
}

pub const DEFAULT_MIME_TYPE: &str = "text/html";

impl RequestContext<Vec<u8>> {
    /// A context that collects output in memory.
    pub fn buffered() -> Self {
        RequestContext::new(Vec::new())
    }

    /// Output written so far, decoded lossily.
    pub fn output_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

impl<W: Write> RequestContext<W> {
    pub fn new(output: W) -> Self {
        RequestContext {
            output,
            mime_type: DEFAULT_MIME_TYPE.to_owned(),
            parameters: HashMap::new(),
            persistent: HashMap::new(),
            temporary: HashMap::new(),
        }
    }

    /// Builder-style request parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = mime.into();
        self
    }

    /// Replace the persistent parameter map, e.g. with one carried over from
    /// a previous request.
    pub fn with_persistent(mut self, persistent: HashMap<String, String>) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn persistent(&self) -> &HashMap<String, String> {
        &self.persistent
    }

    pub fn into_persistent(self) -> HashMap<String, String> {
        self.persistent
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<W: Write> RenderContext for RequestContext<W> {
    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn set_mime_type(&mut self, mime: &str) {
        mime.clone_into(&mut self.mime_type);
    }

    fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    fn persistent_parameter(&self, name: &str) -> Option<&str> {
        self.persistent.get(name).map(String::as_str)
    }

    fn set_persistent_parameter(&mut self, name: &str, value: String) {
        self.persistent.insert(name.to_owned(), value);
    }

    fn remove_persistent_parameter(&mut self, name: &str) {
        self.persistent.remove(name);
    }

    fn temporary_parameter(&self, name: &str) -> Option<&str> {
        self.temporary.get(name).map(String::as_str)
    }

    fn set_temporary_parameter(&mut self, name: &str, value: String) {
        self.temporary.insert(name.to_owned(), value);
    }

    fn remove_temporary_parameter(&mut self, name: &str) {
        self.temporary.remove(name);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_output() {
        let mut ctx = RequestContext::buffered();
        ctx.write_str("a").unwrap();
        ctx.write_str("ž").unwrap();
        assert_eq!(ctx.output_str(), "až");
        assert_eq!(ctx.output().as_slice(), "až".as_bytes());
    }

    #[test]
    fn parameter_maps_are_separate() {
        let mut ctx = RequestContext::buffered().with_parameter("k", "request");
        ctx.set_persistent_parameter("k", "persistent".into());
        ctx.set_temporary_parameter("k", "temporary".into());
        assert_eq!(ctx.parameter("k"), Some("request"));
        assert_eq!(ctx.persistent_parameter("k"), Some("persistent"));
        assert_eq!(ctx.temporary_parameter("k"), Some("temporary"));

        ctx.remove_temporary_parameter("k");
        assert_eq!(ctx.temporary_parameter("k"), None);
        assert_eq!(ctx.into_persistent().get("k").map(String::as_str), Some("persistent"));
    }

    #[test]
    fn mime_type() {
        let mut ctx = RequestContext::buffered();
        assert_eq!(ctx.mime_type(), DEFAULT_MIME_TYPE);
        ctx.set_mime_type("text/plain");
        assert_eq!(ctx.mime_type(), "text/plain");
    }
}
