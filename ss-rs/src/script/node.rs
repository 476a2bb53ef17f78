//! Document tree produced by the parser.
//!
//! The tree is closed: a [`Document`] owns a list of [`Node`]s, and only
//! [`ForLoop`] nodes have children.  Every type here implements `Display`,
//! writing the node back as SmartScript source that parses to an equal tree.

use std::fmt;

use super::token::Element;

/// Root of a parsed script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, escapes resolved.
    Text(String),
    /// `{$= ... $}`; never empty.
    Echo(Vec<Element>),
    /// `{$ FOR var start end [step] $} ... {$END$}`
    For(ForLoop),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub variable: String,
    /// Start, end and step are each a variable, an integer or a string.
    pub start: Element,
    pub end: Element,
    pub step: Option<Element>,
    pub body: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Document { children }
    }

    /// Total number of nodes below the root.
    pub fn node_count(&self) -> usize {
        count(&self.children)
    }
}

fn count(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|n| match n {
            Node::For(f) => 1 + count(&f.body),
            _ => 1,
        })
        .sum()
}

// ── Reconstruction ────────────────────────────────────────────────────────────

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.children.iter().try_for_each(|n| write!(f, "{n}"))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => {
                for c in text.chars() {
                    match c {
                        '\\' => f.write_str("\\\\")?,
                        '{' => f.write_str("\\{")?,
                        c => write!(f, "{c}")?,
                    }
                }
                Ok(())
            }
            Node::Echo(elements) => {
                f.write_str("{$=")?;
                for e in elements {
                    write!(f, " {e}")?;
                }
                f.write_str(" $}")
            }
            Node::For(for_loop) => write!(f, "{for_loop}"),
        }
    }
}

impl fmt::Display for ForLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{$ FOR {} {} {}", self.variable, self.start, self.end)?;
        if let Some(step) = &self.step {
            write!(f, " {step}")?;
        }
        f.write_str(" $}")?;
        self.body.iter().try_for_each(|n| write!(f, "{n}"))?;
        f.write_str("{$END$}")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::token::Operator;

    #[test]
    fn text_escapes_structural_characters() {
        let node = Node::Text(r"a {$ b \ c".into());
        assert_eq!(node.to_string(), r"a \{$ b \\ c");
    }

    #[test]
    fn echo_source_form() {
        let node = Node::Echo(vec![
            Element::Variable("i".into()),
            Element::Int(2),
            Element::Operator(Operator::Mul),
            Element::Function("dup".into()),
        ]);
        assert_eq!(node.to_string(), "{$= i 2 * @dup $}");
    }

    #[test]
    fn for_source_form() {
        let doc = Document::new(vec![Node::For(ForLoop {
            variable: "i".into(),
            start: Element::Int(1),
            end: Element::Str("10".into()),
            step: None,
            body: vec![Node::Text("x".into())],
        })]);
        assert_eq!(doc.to_string(), r#"{$ FOR i 1 "10" $}x{$END$}"#);
    }

    #[test]
    fn node_count_includes_nested_bodies() {
        let inner = ForLoop {
            variable: "j".into(),
            start: Element::Int(1),
            end: Element::Int(2),
            step: Some(Element::Int(1)),
            body: vec![Node::Echo(vec![Element::Variable("j".into())])],
        };
        let outer = ForLoop {
            variable: "i".into(),
            start: Element::Int(1),
            end: Element::Int(2),
            step: None,
            body: vec![Node::Text("a".into()), Node::For(inner)],
        };
        let doc = Document::new(vec![Node::For(outer), Node::Text("b".into())]);
        assert_eq!(doc.node_count(), 5);
    }
}
