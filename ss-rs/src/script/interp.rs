//! SmartScript interpreter.
//!
//! The [`Interpreter`] walks a parsed [`Document`] depth-first, writing text
//! and echo results to a [`RenderContext`].  It owns only configuration (the
//! built-in table and the loop cap); every call to [`Interpreter::execute`]
//! gets a fresh [`StackStore`], so one interpreter and one document can serve
//! any number of executions.

use std::cmp::Ordering;
use std::io;

use thiserror::Error;
use tracing::{debug_span, trace, warn};

use super::{
    builtins::{EvalStack, FunctionTable},
    node::{Document, ForLoop, Node},
    stack::{StackError, StackStore},
    token::Element,
    value::{Value, ValueError},
};
use crate::config::EngineConfig;
use crate::context::RenderContext;

/// Loop cap used by [`Interpreter::new`].
pub const DEFAULT_MAX_LOOP_ITERATIONS: u64 = 1_000_000;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("unknown function `@{0}`")]
    UnknownFunction(String),
    #[error("not enough operands for `{needed_by}`")]
    StackUnderflow { needed_by: String },
    #[error("echo tag left {0} values on the stack, expected exactly 1")]
    EchoImbalance(usize),
    #[error("`{0}` cannot be used as a loop bound")]
    InvalidLoopElement(String),
    #[error("loop over `{variable}` exceeded {limit} iterations")]
    LoopLimit { variable: String, limit: u64 },
    #[error("@{name}: {message}")]
    Function { name: String, message: String },
    #[error("write failed: {0}")]
    Output(#[from] io::Error),
}

// ── Interpreter ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Interpreter {
    functions: FunctionTable,
    /// Per-loop iteration cap; 0 disables it.
    max_loop_iterations: u64,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with the standard built-ins and the default loop cap.
    pub fn new() -> Self {
        Interpreter {
            functions: FunctionTable::standard(),
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
        }
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        let functions = if config.standard_functions {
            FunctionTable::standard()
        } else {
            FunctionTable::new()
        };
        Interpreter {
            functions,
            max_loop_iterations: config.max_loop_iterations,
        }
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionTable {
        &mut self.functions
    }

    pub fn max_loop_iterations(&self) -> u64 {
        self.max_loop_iterations
    }

    pub fn set_max_loop_iterations(&mut self, limit: u64) {
        self.max_loop_iterations = limit;
    }

    /// Run `doc` against `ctx`.
    ///
    /// On error, whatever was written before the failure stays in `ctx`.
    pub fn execute(&self, doc: &Document, ctx: &mut dyn RenderContext) -> Result<(), ExecError> {
        let _span = debug_span!("execute", nodes = doc.node_count()).entered();
        let mut exec = Execution {
            interp: self,
            stacks: StackStore::new(),
            ctx,
        };
        exec.run(&doc.children)
    }
}

// ── Execution state ───────────────────────────────────────────────────────────

/// State of one [`Interpreter::execute`] call.
struct Execution<'i, 'c> {
    interp: &'i Interpreter,
    stacks: StackStore,
    ctx: &'c mut dyn RenderContext,
}

impl Execution<'_, '_> {
    fn run(&mut self, nodes: &[Node]) -> Result<(), ExecError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.ctx.write_str(text)?,
                Node::Echo(elements) => self.echo(elements)?,
                Node::For(lp) => self.for_loop(lp)?,
            }
        }
        Ok(())
    }

    /// Named stacks first, then request parameters.
    fn resolve(&self, name: &str) -> Result<Value, ExecError> {
        if let Some(v) = self.stacks.lookup(name) {
            return Ok(v.clone());
        }
        self.ctx
            .parameter(name)
            .map(Value::from)
            .ok_or_else(|| ExecError::UnknownVariable(name.to_owned()))
    }

    fn echo(&mut self, elements: &[Element]) -> Result<(), ExecError> {
        let mut stack = EvalStack::new();
        for element in elements {
            match element {
                Element::Variable(name) => stack.push(self.resolve(name)?),
                Element::Str(s) => stack.push(Value::Str(s.clone())),
                Element::Int(n) => stack.push(Value::Int(*n)),
                Element::Real(x) => stack.push(Value::Real(*x)),
                Element::Operator(op) => {
                    let rhs = stack.pop(op)?;
                    let mut lhs = stack.pop(op)?;
                    lhs.apply(*op, &rhs)?;
                    stack.push(lhs);
                }
                Element::Function(name) => {
                    let f = self
                        .interp
                        .functions
                        .get(name)
                        .ok_or_else(|| ExecError::UnknownFunction(name.clone()))?;
                    f(&mut stack, &mut *self.ctx)?;
                }
            }
        }
        if stack.len() != 1 {
            return Err(ExecError::EchoImbalance(stack.len()));
        }
        let result = stack.pop("echo")?;
        self.ctx.write_str(&result.to_string())?;
        Ok(())
    }

    /// Reduce a loop bound to a value.
    fn bound(&self, element: &Element) -> Result<Value, ExecError> {
        match element {
            Element::Variable(name) => self.resolve(name),
            Element::Int(n) => Ok(Value::Int(*n)),
            Element::Real(x) => Ok(Value::Real(*x)),
            Element::Str(s) => Ok(Value::Str(s.clone())),
            Element::Function(_) | Element::Operator(_) => {
                Err(ExecError::InvalidLoopElement(element.to_string()))
            }
        }
    }

    fn for_loop(&mut self, lp: &ForLoop) -> Result<(), ExecError> {
        let start = self.bound(&lp.start)?;
        let end = self.bound(&lp.end)?;
        let step = match &lp.step {
            Some(step) => self.bound(step)?,
            None => Value::Int(1),
        };
        // Ordering of the loop variable against `end` that stops the loop.
        let past = match step.num_compare(&Value::Int(0))? {
            Ordering::Less => Ordering::Less,
            _ => Ordering::Greater,
        };

        self.stacks.push(lp.variable.as_str(), start);
        let limit = self.interp.max_loop_iterations;
        let mut iterations: u64 = 0;
        loop {
            let current = self.stacks.peek(&lp.variable)?;
            if current.num_compare(&end)? == past {
                break;
            }
            if limit != 0 && iterations == limit {
                warn!(variable = %lp.variable, limit, "loop iteration cap reached");
                return Err(ExecError::LoopLimit {
                    variable: lp.variable.clone(),
                    limit,
                });
            }
            iterations += 1;
            trace!(variable = %lp.variable, value = %current, iterations, "loop iteration");
            self.run(&lp.body)?;
            let current = self.stacks.peek_mut(&lp.variable)?;
            let mut next = current.clone();
            next.add(&step)?;
            // Integer addition wraps; a wrapped value moves against the step.
            if next.num_compare(current)? == past.reverse() {
                break;
            }
            *current = next;
        }
        self.stacks.pop(&lp.variable)?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
