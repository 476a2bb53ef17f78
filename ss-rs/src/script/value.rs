//! Runtime value cell for SmartScript.
//!
//! Every value is one of absent, text, a 32-bit integer or a 64-bit real.
//! Arithmetic coerces both operands to numbers first; the coercion rules live
//! in [`Value::apply`] and [`Value::num_compare`] and nowhere else.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use super::token::Operator;

/// Raised when a value cannot take part in arithmetic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("cannot use `{text}` as a number")]
    NotNumeric { text: String },
}

/// A SmartScript runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Str(String),
    Int(i32),
    Real(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Real(x) => {
                if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
        }
    }
}

/// A value reduced to one of the two numeric representations.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i32),
    Real(f64),
}

impl Number {
    fn as_real(self) -> f64 {
        match self {
            Number::Int(n) => f64::from(n),
            Number::Real(x) => x,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the payload kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "absent",
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Real(_) => "real",
        }
    }

    /// Coerce to `f64` using the arithmetic coercion rules.
    pub fn as_real(&self) -> Result<f64, ValueError> {
        Ok(self.to_number()?.as_real())
    }

    fn to_number(&self) -> Result<Number, ValueError> {
        match self {
            Value::Null => Ok(Number::Int(0)),
            Value::Int(n) => Ok(Number::Int(*n)),
            Value::Real(x) => Ok(Number::Real(*x)),
            Value::Str(s) => {
                if let Ok(n) = s.parse::<i32>() {
                    Ok(Number::Int(n))
                } else if let Some(x) = parse_real(s) {
                    Ok(Number::Real(x))
                } else {
                    Err(ValueError::NotNumeric { text: s.clone() })
                }
            }
        }
    }

    // ── Arithmetic ────────────────────────────────────────────────────────────

    /// Apply `op` with `rhs` as the right operand, replacing `self` with the
    /// result.
    ///
    /// Integers stay integers unless either side is real or the operation is
    /// a division. Integer arithmetic wraps at 32 bits. Division by zero
    /// yields an infinity or NaN rather than an error.
    pub fn apply(&mut self, op: Operator, rhs: &Value) -> Result<(), ValueError> {
        let a = self.to_number()?;
        let b = rhs.to_number()?;
        *self = match (op, a, b) {
            (Operator::Div, a, b) => Value::Real(a.as_real() / b.as_real()),
            (Operator::Pow, Number::Int(a), Number::Int(b)) if b >= 0 => {
                Value::Int(a.wrapping_pow(b.unsigned_abs()))
            }
            (Operator::Add, Number::Int(a), Number::Int(b)) => Value::Int(a.wrapping_add(b)),
            (Operator::Sub, Number::Int(a), Number::Int(b)) => Value::Int(a.wrapping_sub(b)),
            (Operator::Mul, Number::Int(a), Number::Int(b)) => Value::Int(a.wrapping_mul(b)),
            (op, a, b) => Value::Real(real_op(op, a.as_real(), b.as_real())),
        };
        Ok(())
    }

    pub fn add(&mut self, rhs: &Value) -> Result<(), ValueError> {
        self.apply(Operator::Add, rhs)
    }

    pub fn subtract(&mut self, rhs: &Value) -> Result<(), ValueError> {
        self.apply(Operator::Sub, rhs)
    }

    pub fn multiply(&mut self, rhs: &Value) -> Result<(), ValueError> {
        self.apply(Operator::Mul, rhs)
    }

    pub fn divide(&mut self, rhs: &Value) -> Result<(), ValueError> {
        self.apply(Operator::Div, rhs)
    }

    pub fn power(&mut self, rhs: &Value) -> Result<(), ValueError> {
        self.apply(Operator::Pow, rhs)
    }

    /// Numeric three-way comparison.  Leaves both operands untouched.
    ///
    /// Reals are ordered with [`f64::total_cmp`], so NaN compares above every
    /// other value instead of poisoning loop conditions.
    pub fn num_compare(&self, rhs: &Value) -> Result<Ordering, ValueError> {
        match (self.to_number()?, rhs.to_number()?) {
            (Number::Int(a), Number::Int(b)) => Ok(a.cmp(&b)),
            (a, b) => Ok(a.as_real().total_cmp(&b.as_real())),
        }
    }
}

/// Decimal text only: `inf`, `NaN` and literals that overflow are not numbers.
fn parse_real(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|x| x.is_finite())
}

fn real_op(op: Operator, a: f64, b: f64) -> f64 {
    match op {
        Operator::Add => a + b,
        Operator::Sub => a - b,
        Operator::Mul => a * b,
        Operator::Div => a / b,
        Operator::Pow => a.powf(b),
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
