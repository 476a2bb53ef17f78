//! Built-in `@functions` callable from echo tags.
//!
//! A built-in works directly on the echo tag's evaluation stack: it pops its
//! arguments (the last-pushed argument comes off first) and pushes its
//! results.  Most built-ins pop N values and push exactly one; setters push
//! an absent value, which renders as nothing.  `dup` and `swap` only
//! rearrange the stack.
//!
//! [`FunctionTable::standard`] holds the stock catalogue; embedders can add
//! their own with [`FunctionTable::register`].

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::interp::ExecError;
use super::value::Value;
use crate::context::RenderContext;

// ── Evaluation stack ──────────────────────────────────────────────────────────

/// The operand stack of a single echo tag.
#[derive(Debug, Default)]
pub struct EvalStack {
    values: Vec<Value>,
}

impl EvalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Pop the top value; `needed_by` names the consumer in the underflow
    /// error.
    pub fn pop(&mut self, needed_by: impl fmt::Display) -> Result<Value, ExecError> {
        self.values.pop().ok_or_else(|| ExecError::StackUnderflow {
            needed_by: needed_by.to_string(),
        })
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ── Function table ────────────────────────────────────────────────────────────

pub type Builtin = fn(&mut EvalStack, &mut dyn RenderContext) -> Result<(), ExecError>;

/// Name → built-in lookup table.
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Builtin>,
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FunctionTable").field("functions", &names).finish()
    }
}

impl FunctionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock catalogue.
    pub fn standard() -> Self {
        let mut table = Self::new();
        let entries: [(&str, Builtin); 12] = [
            ("sin", sin),
            ("decfmt", decfmt),
            ("dup", dup),
            ("swap", swap),
            ("setMimeType", set_mime_type),
            ("paramGet", param_get),
            ("pparamGet", pparam_get),
            ("pparamSet", pparam_set),
            ("pparamDel", pparam_del),
            ("tparamGet", tparam_get),
            ("tparamSet", tparam_set),
            ("tparamDel", tparam_del),
        ];
        for (name, f) in entries {
            table.register(name, f);
        }
        table
    }

    /// Add or replace a built-in.  Returns the previous entry, if any.
    pub fn register(&mut self, name: impl Into<String>, f: Builtin) -> Option<Builtin> {
        self.functions.insert(name.into(), f)
    }

    pub fn get(&self, name: &str) -> Option<Builtin> {
        self.functions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

// ── Numeric functions ─────────────────────────────────────────────────────────

/// `x → sin(x°)`
fn sin(stack: &mut EvalStack, _ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    let x = stack.pop("@sin")?.as_real()?;
    stack.push(Value::Real(x.to_radians().sin()));
    Ok(())
}

/// `x pattern → text`
fn decfmt(stack: &mut EvalStack, _ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    let pattern = stack.pop("@decfmt")?.to_string();
    let x = stack.pop("@decfmt")?.as_real()?;
    let format = DecimalFormat::parse(&pattern).ok_or_else(|| ExecError::Function {
        name: "decfmt".into(),
        message: format!("invalid decimal pattern `{pattern}`"),
    })?;
    stack.push(Value::Str(format.format(x)));
    Ok(())
}

/// A decimal pattern such as `0.000`, `#.##` or `#,##0.00`.
///
/// `0` is a mandatory digit and `#` an optional one; a `,` in the integer
/// part sets the grouping size to the number of digits after it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DecimalFormat {
    min_int: usize,
    grouping: Option<usize>,
    min_frac: usize,
    max_frac: usize,
}

impl DecimalFormat {
    fn parse(pattern: &str) -> Option<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^([#0,]*)(?:\.(0*#*))?$").expect("decimal pattern regex is valid")
        });
        let caps = re.captures(pattern)?;
        let int = caps.get(1).map_or("", |m| m.as_str());
        let frac = caps.get(2).map_or("", |m| m.as_str());
        if int.is_empty() && frac.is_empty() {
            return None;
        }
        Some(DecimalFormat {
            min_int: int.matches('0').count(),
            grouping: int.rfind(',').map(|i| int.len() - i - 1).filter(|&g| g > 0),
            min_frac: frac.matches('0').count(),
            max_frac: frac.len(),
        })
    }

    fn format(&self, x: f64) -> String {
        if !x.is_finite() {
            return x.to_string();
        }
        let fixed = format!("{:.*}", self.max_frac, x.abs());
        let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

        let mut frac = frac.to_owned();
        while frac.len() > self.min_frac && frac.ends_with('0') {
            frac.pop();
        }
        let mut int = int.trim_start_matches('0').to_owned();
        while int.len() < self.min_int {
            int.insert(0, '0');
        }
        if let Some(size) = self.grouping {
            int = group_digits(&int, size);
        }

        let mut out = String::new();
        if x.is_sign_negative() && int.chars().chain(frac.chars()).any(|c| c.is_ascii_digit() && c != '0') {
            out.push('-');
        }
        out.push_str(&int);
        if !frac.is_empty() {
            out.push('.');
            out.push_str(&frac);
        }
        if out.is_empty() {
            out.push('0');
        }
        out
    }
}

fn group_digits(digits: &str, size: usize) -> String {
    let len = digits.chars().count();
    let mut out = String::with_capacity(len + len / size);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % size == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Stack shuffling ───────────────────────────────────────────────────────────

/// `x → x x`
fn dup(stack: &mut EvalStack, _ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    let x = stack.pop("@dup")?;
    stack.push(x.clone());
    stack.push(x);
    Ok(())
}

/// `a b → b a`
fn swap(stack: &mut EvalStack, _ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    let b = stack.pop("@swap")?;
    let a = stack.pop("@swap")?;
    stack.push(b);
    stack.push(a);
    Ok(())
}

// ── Context access ────────────────────────────────────────────────────────────

/// `mime → absent`
fn set_mime_type(stack: &mut EvalStack, ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    let mime = stack.pop("@setMimeType")?;
    ctx.set_mime_type(&mime.to_string());
    stack.push(Value::Null);
    Ok(())
}

/// Shared body of the `*paramGet` family: `name default → value`.
fn get_with_default(
    stack: &mut EvalStack,
    needed_by: &str,
    lookup: impl FnOnce(&str) -> Option<String>,
) -> Result<(), ExecError> {
    let default = stack.pop(needed_by)?;
    let name = stack.pop(needed_by)?.to_string();
    stack.push(lookup(&name).map_or(default, Value::Str));
    Ok(())
}

fn param_get(stack: &mut EvalStack, ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    get_with_default(stack, "@paramGet", |name| ctx.parameter(name).map(str::to_owned))
}

fn pparam_get(stack: &mut EvalStack, ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    get_with_default(stack, "@pparamGet", |name| {
        ctx.persistent_parameter(name).map(str::to_owned)
    })
}

fn tparam_get(stack: &mut EvalStack, ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    get_with_default(stack, "@tparamGet", |name| {
        ctx.temporary_parameter(name).map(str::to_owned)
    })
}

/// `value name → absent`
fn pparam_set(stack: &mut EvalStack, ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    let name = stack.pop("@pparamSet")?.to_string();
    let value = stack.pop("@pparamSet")?;
    ctx.set_persistent_parameter(&name, value.to_string());
    stack.push(Value::Null);
    Ok(())
}

fn tparam_set(stack: &mut EvalStack, ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    let name = stack.pop("@tparamSet")?.to_string();
    let value = stack.pop("@tparamSet")?;
    ctx.set_temporary_parameter(&name, value.to_string());
    stack.push(Value::Null);
    Ok(())
}

/// `name → absent`
fn pparam_del(stack: &mut EvalStack, ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    let name = stack.pop("@pparamDel")?.to_string();
    ctx.remove_persistent_parameter(&name);
    stack.push(Value::Null);
    Ok(())
}

fn tparam_del(stack: &mut EvalStack, ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
    let name = stack.pop("@tparamDel")?.to_string();
    ctx.remove_temporary_parameter(&name);
    stack.push(Value::Null);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;

    fn call(name: &str, args: Vec<Value>, ctx: &mut dyn RenderContext) -> Result<Vec<Value>, ExecError> {
        let f = FunctionTable::standard().get(name).expect("no such builtin");
        let mut stack = EvalStack::new();
        for a in args {
            stack.push(a);
        }
        f(&mut stack, ctx)?;
        let mut out = Vec::new();
        while let Some(v) = stack.values.pop() {
            out.insert(0, v);
        }
        Ok(out)
    }

    fn call_plain(name: &str, args: Vec<Value>) -> Vec<Value> {
        call(name, args, &mut RequestContext::buffered()).expect("builtin failed")
    }

    #[test]
    fn standard_catalogue() {
        let table = FunctionTable::standard();
        for name in ["sin", "decfmt", "dup", "swap", "setMimeType", "paramGet", "pparamDel"] {
            assert!(table.contains(name), "missing {name}");
        }
        assert!(!table.contains("nope"));
        assert!(FunctionTable::new().get("sin").is_none());
    }

    #[test]
    fn register_replaces() {
        let mut table = FunctionTable::standard();
        assert!(table.register("dup", swap).is_some());
        assert!(table.register("mine", dup).is_none());
        assert!(table.contains("mine"));
    }

    #[test]
    fn sin_takes_degrees() {
        let out = call_plain("sin", vec![Value::Int(90)]);
        assert_eq!(out, vec![Value::Real(1.0)]);
        let out = call_plain("sin", vec![Value::from("0")]);
        assert_eq!(out, vec![Value::Real(0.0)]);
    }

    #[test]
    fn decfmt_patterns() {
        let fmt = |x: f64, p: &str| DecimalFormat::parse(p).unwrap().format(x);
        assert_eq!(fmt(3.14159, "0.000"), "3.142");
        assert_eq!(fmt(2.0, "0.00"), "2.00");
        assert_eq!(fmt(2.5, "0.##"), "2.5");
        assert_eq!(fmt(0.5, "#.##"), ".5");
        assert_eq!(fmt(0.0, "#.##"), "0");
        assert_eq!(fmt(1234567.891, "#,##0.00"), "1,234,567.89");
        assert_eq!(fmt(-1.25, "0.0"), "-1.2");
        assert_eq!(fmt(-0.01, "0"), "0");
        assert_eq!(fmt(7.0, "000"), "007");
    }

    #[test]
    fn decfmt_builtin() {
        let out = call_plain("decfmt", vec![Value::Real(1.5), Value::from("0.00")]);
        assert_eq!(out, vec![Value::from("1.50")]);

        let err = call(
            "decfmt",
            vec![Value::Int(1), Value::from("abc")],
            &mut RequestContext::buffered(),
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::Function { name, .. } if name == "decfmt"));
    }

    #[test]
    fn dup_and_swap() {
        assert_eq!(call_plain("dup", vec![Value::Int(1)]), vec![Value::Int(1), Value::Int(1)]);
        assert_eq!(
            call_plain("swap", vec![Value::Int(1), Value::Int(2)]),
            vec![Value::Int(2), Value::Int(1)]
        );
    }

    #[test]
    fn underflow() {
        let err = call("swap", vec![Value::Int(1)], &mut RequestContext::buffered()).unwrap_err();
        assert!(matches!(err, ExecError::StackUnderflow { needed_by } if needed_by == "@swap"));
    }

    #[test]
    fn set_mime_type_updates_context() {
        let mut ctx = RequestContext::buffered();
        let out = call("setMimeType", vec![Value::from("text/plain")], &mut ctx).unwrap();
        assert_eq!(out, vec![Value::Null]);
        assert_eq!(ctx.mime_type(), "text/plain");
    }

    #[test]
    fn param_get_falls_back_to_default() {
        let mut ctx = RequestContext::buffered().with_parameter("a", "1");
        let out = call("paramGet", vec![Value::from("a"), Value::Int(0)], &mut ctx).unwrap();
        assert_eq!(out, vec![Value::from("1")]);
        let out = call("paramGet", vec![Value::from("b"), Value::Int(0)], &mut ctx).unwrap();
        assert_eq!(out, vec![Value::Int(0)]);
    }

    #[test]
    fn persistent_parameters() {
        let mut ctx = RequestContext::buffered();
        call("pparamSet", vec![Value::Int(5), Value::from("count")], &mut ctx).unwrap();
        assert_eq!(ctx.persistent_parameter("count"), Some("5"));
        let out = call("pparamGet", vec![Value::from("count"), Value::Null], &mut ctx).unwrap();
        assert_eq!(out, vec![Value::from("5")]);
        call("pparamDel", vec![Value::from("count")], &mut ctx).unwrap();
        assert_eq!(ctx.persistent_parameter("count"), None);
    }

    #[test]
    fn temporary_parameters() {
        let mut ctx = RequestContext::buffered();
        call("tparamSet", vec![Value::from("x"), Value::from("k")], &mut ctx).unwrap();
        let out = call("tparamGet", vec![Value::from("k"), Value::Null], &mut ctx).unwrap();
        assert_eq!(out, vec![Value::from("x")]);
        call("tparamDel", vec![Value::from("k")], &mut ctx).unwrap();
        assert_eq!(ctx.temporary_parameter("k"), None);
    }
}
