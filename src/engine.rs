//! The token-driven stack machine.
//!
//! [`Engine::parse`] is the single mutation point. Each token is tried, in
//! order, as a numeric literal in the current radix, a `:symbol` literal, a
//! macro, and finally an operator name. Whichever state matches owns the
//! outcome; a failing operator never falls back to another reading.
//!
//! ## Argument popping
//!
//! An operator with `k` fixed parameters takes the top `k` values, and the
//! whole window leaves the stack before any of them is type-checked. An
//! operator with a `RestOfStack` slot takes the entire current stack: the
//! fixed slots before and after the rest slot are cut from the bottom and the
//! top of it, and everything in between becomes the captured list.
//!
//! Neither case restores anything on failure. Rollback belongs to
//! [`crate::Session`].

use crate::OperatorError;
use crate::builtinops::{OpKind, OperatorSpec, OperatorTable};
use crate::environment::Environment;
use crate::macros;
use crate::radix::{self, ParseRationalError, Radix};
use crate::scope::ScopeStack;
use crate::value::{Output, ParamKind, Value};
use tracing::{debug, trace};

/// Digits after the radix point in positional display
pub const DEFAULT_PRECISION: usize = 16;

/// Deepest nesting of `parse` through macros and `eval`
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Startup settings for an [`Engine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub base: u32,
    pub fraction_display: bool,
    pub precision: usize,
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base: 10,
            fraction_display: true,
            precision: DEFAULT_PRECISION,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    radix: Radix,
    fraction_display: bool,
    precision: usize,
    max_depth: usize,
    depth: usize,
    scopes: ScopeStack,
    env: Environment,
    operators: &'static OperatorTable,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Base 10, fraction display on
    pub fn new() -> Self {
        Engine {
            radix: Radix::DECIMAL,
            fraction_display: true,
            precision: DEFAULT_PRECISION,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
            scopes: ScopeStack::new(),
            env: Environment::new(),
            operators: OperatorTable::builtin(),
        }
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, OperatorError> {
        let radix = Radix::new(config.base).map_err(OperatorError::InvalidBase)?;
        Ok(Engine {
            radix,
            fraction_display: config.fraction_display,
            precision: config.precision,
            max_depth: config.max_depth,
            ..Self::new()
        })
    }

    pub fn base(&self) -> u32 {
        self.radix.get()
    }

    pub fn radix(&self) -> Radix {
        self.radix
    }

    pub fn fraction_display(&self) -> bool {
        self.fraction_display
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn operators(&self) -> &'static OperatorTable {
        self.operators
    }

    /// The current stack, bottom first
    pub fn stack(&self) -> &[Value] {
        self.scopes.current()
    }

    /// Number of open scopes, including the outermost
    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Every open stack, outermost first
    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    /// Swap in a whole set of stacks, returning the old one
    pub fn restore_scopes(&mut self, scopes: ScopeStack) -> ScopeStack {
        std::mem::replace(&mut self.scopes, scopes)
    }

    /// Swap in a new current stack, returning the old one
    pub fn replace_stack(&mut self, values: Vec<Value>) -> Vec<Value> {
        self.scopes.replace_current(values)
    }

    /// A value as the user would type it back in the current radix
    pub fn display_token(&self, value: &Value) -> String {
        match value {
            Value::Number(n) => {
                radix::format_rational(n, self.radix, self.fraction_display, self.precision)
            }
            Value::Symbol(name) => format!(":{}", name),
        }
    }

    pub fn display_stack(&self) -> Vec<String> {
        self.stack()
            .iter()
            .map(|value| self.display_token(value))
            .collect()
    }

    /// Consume one token
    pub fn parse(&mut self, token: &str) -> Result<(), OperatorError> {
        if self.depth >= self.max_depth {
            return Err(OperatorError::MacroExpansionTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = self.dispatch(token);
        self.depth -= 1;
        result
    }

    fn dispatch(&mut self, token: &str) -> Result<(), OperatorError> {
        trace!(token, depth = self.depth, "parse");

        match radix::parse_rational(token, self.radix) {
            Ok(n) => {
                self.scopes.push(Value::Number(n));
                return Ok(());
            }
            Err(ParseRationalError::NotANumber(_)) => {}
            Err(ParseRationalError::ZeroDenominator) => return Err(OperatorError::DivisionByZero),
            Err(ParseRationalError::ExponentOutOfRange) => {
                return Err(OperatorError::invalid("exponent too large"));
            }
        }

        if let Some(name) = token.strip_prefix(':').filter(|name| !name.is_empty()) {
            self.scopes.push(Value::symbol(name));
            return Ok(());
        }

        if let Some(expansion) = macros::expand(token) {
            for part in &expansion {
                self.parse(part)?;
            }
            return Ok(());
        }

        let op = self.operators.resolve(token)?;
        let output = self.apply(op)?;
        self.scopes.extend(output.into_values());
        Ok(())
    }

    /// Pop the arguments `op` declares and run it
    fn apply(&mut self, op: &'static OperatorSpec) -> Result<Output, OperatorError> {
        match op.op_kind {
            OpKind::Function(f) => {
                let args = self.pop_fixed(op.params)?;
                f(&args)
            }
            OpKind::Command(c) => {
                let args = self.pop_fixed(op.params)?;
                c(self, &args)
            }
            OpKind::Collector(collect) => {
                let (captured, args) = self.pop_with_rest(op)?;
                collect(self, captured, &args)
            }
        }
    }

    fn pop_fixed(&mut self, params: &[ParamKind]) -> Result<Vec<Value>, OperatorError> {
        let stack = self.scopes.current_mut();
        if stack.len() < params.len() {
            return Err(OperatorError::arity(params.len(), stack.len()));
        }
        let args = stack.split_off(stack.len() - params.len());
        self.check_kinds(&args, params)?;
        Ok(args)
    }

    /// Take the whole stack, cutting the fixed slots off both ends
    fn pop_with_rest(
        &mut self,
        op: &OperatorSpec,
    ) -> Result<(Vec<Value>, Vec<Value>), OperatorError> {
        let Some(rest) = op.rest_index() else {
            return Ok((Vec::new(), self.pop_fixed(op.params)?));
        };
        let fixed_kinds: Vec<ParamKind> = op
            .params
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != rest)
            .map(|(_, kind)| *kind)
            .collect();
        let available = self.stack().len();
        if available < fixed_kinds.len() {
            return Err(OperatorError::arity(fixed_kinds.len(), available));
        }

        let mut captured = std::mem::take(self.scopes.current_mut());
        let above = fixed_kinds.len() - rest;
        let mut fixed: Vec<Value> = captured.drain(..rest).collect();
        fixed.extend(captured.split_off(captured.len() - above));

        self.check_kinds(&fixed, &fixed_kinds)?;
        Ok((captured, fixed))
    }

    fn check_kinds(&self, args: &[Value], params: &[ParamKind]) -> Result<(), OperatorError> {
        for (arg, kind) in args.iter().zip(params) {
            if !kind.accepts(arg) {
                return Err(OperatorError::TypeMismatch {
                    value: self.display_token(arg),
                    expected: *kind,
                });
            }
        }
        Ok(())
    }
}

//
// Operators that need the engine
//

pub fn set_base(engine: &mut Engine, args: &[Value]) -> Result<Output, OperatorError> {
    let radix = match args {
        [Value::Number(n)] => Radix::from_integer(&radix::round_to_integer(n)),
        [Value::Symbol(name)] => Radix::from_name(name),
        _ => return Err(OperatorError::arity(1, args.len())),
    }
    .map_err(OperatorError::InvalidBase)?;
    debug!(base = radix.get(), "radix changed");
    engine.radix = radix;
    Ok(Output::Nothing)
}

pub fn toggle_fraction(engine: &mut Engine, _args: &[Value]) -> Result<Output, OperatorError> {
    engine.fraction_display = !engine.fraction_display;
    debug!(fraction_display = engine.fraction_display, "display mode toggled");
    Ok(Output::Nothing)
}

/// Feed a symbol's text back to `parse` as one token
pub fn eval_symbol(engine: &mut Engine, args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [Value::Symbol(token)] => {
            engine.parse(token)?;
            Ok(Output::Nothing)
        }
        _ => Err(OperatorError::arity(1, args.len())),
    }
}

/// Bind a value to whichever argument is a symbol, preferring the top
pub fn set_variable(engine: &mut Engine, args: &[Value]) -> Result<Output, OperatorError> {
    let (key, value) = match args {
        [value, Value::Symbol(key)] | [Value::Symbol(key), value] => (key, value),
        [_, top] => {
            return Err(OperatorError::TypeMismatch {
                value: engine.display_token(top),
                expected: ParamKind::Symbol,
            });
        }
        _ => return Err(OperatorError::arity(2, args.len())),
    };
    debug!(key = %key, "variable bound");
    engine.env.set(key.as_str(), value.clone());
    Ok(Output::Nothing)
}

pub fn get_variable(engine: &mut Engine, args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [Value::Symbol(key)] => Ok(engine.env.get(key)?.clone().into()),
        _ => Err(OperatorError::arity(1, args.len())),
    }
}

pub fn open_scope(engine: &mut Engine, _args: &[Value]) -> Result<Output, OperatorError> {
    engine.scopes.open();
    debug!(depth = engine.scopes.depth(), "scope opened");
    Ok(Output::Nothing)
}

/// Close the current scope; its contents are spread onto the parent
pub fn close_scope(engine: &mut Engine, _args: &[Value]) -> Result<Output, OperatorError> {
    let values = engine.scopes.close()?;
    debug!(depth = engine.scopes.depth(), len = values.len(), "scope closed");
    Ok(values.into())
}

//
// Meta-operators
//

/// The operator a `map` or fold names
fn target_operator(
    engine: &Engine,
    args: &[Value],
) -> Result<&'static OperatorSpec, OperatorError> {
    let [Value::Symbol(name)] = args else {
        return Err(OperatorError::arity(1, args.len()));
    };
    let op = engine.operators.resolve(name)?;
    if op.rest_index().is_some() {
        return Err(OperatorError::invalid(format!(
            "{} cannot be applied element-wise",
            op.name
        )));
    }
    if op.arity() == 0 {
        return Err(OperatorError::arity(1, 0));
    }
    Ok(op)
}

/// Run a fixed-parameter operator on explicit arguments
fn call_with(engine: &mut Engine, op: &OperatorSpec, args: &[Value]) -> Result<Output, OperatorError> {
    engine.check_kinds(args, op.params)?;
    match op.op_kind {
        OpKind::Function(f) => f(args),
        OpKind::Command(c) => c(engine, args),
        OpKind::Collector(_) => Err(OperatorError::invalid(format!(
            "{} cannot be applied element-wise",
            op.name
        ))),
    }
}

/// Apply an operator to every captured element
///
/// An operator with `n` parameters takes its first `n - 1` arguments from the
/// top of the captured stack; they are passed unchanged with each remaining
/// element in the last position.
pub fn map_operator(
    engine: &mut Engine,
    captured: Vec<Value>,
    args: &[Value],
) -> Result<Output, OperatorError> {
    let op = target_operator(engine, args)?;
    let mut list = captured;
    let fixed_len = op.arity() - 1;
    if list.len() < fixed_len {
        return Err(OperatorError::arity(fixed_len, list.len()));
    }
    let fixed = list.split_off(list.len() - fixed_len);
    trace!(op = op.name, len = list.len(), "map");

    let mut results = Vec::with_capacity(list.len());
    for element in list {
        let mut call_args = fixed.clone();
        call_args.push(element);
        results.extend(call_with(engine, op, &call_args)?.into_values());
    }
    Ok(results.into())
}

fn fold(engine: &mut Engine, list: Vec<Value>, args: &[Value]) -> Result<Output, OperatorError> {
    let op = target_operator(engine, args)?;
    if op.arity() != 2 {
        return Err(OperatorError::arity(2, op.arity()));
    }
    trace!(op = op.name, len = list.len(), "fold");

    let mut items = list.into_iter();
    let Some(mut acc) = items.next() else {
        return Err(OperatorError::arity(1, 0));
    };
    for item in items {
        let mut step = call_with(engine, op, &[acc, item])?.into_values();
        acc = match (step.pop(), step.is_empty()) {
            (Some(value), true) => value,
            _ => {
                return Err(OperatorError::invalid(format!(
                    "{} does not reduce to one value",
                    op.name
                )));
            }
        };
    }
    Ok(acc.into())
}

pub fn fold_left(
    engine: &mut Engine,
    captured: Vec<Value>,
    args: &[Value],
) -> Result<Output, OperatorError> {
    fold(engine, captured, args)
}

/// Fold over the captured stack taken top first
pub fn fold_right(
    engine: &mut Engine,
    mut captured: Vec<Value>,
    args: &[Value],
) -> Result<Output, OperatorError> {
    captured.reverse();
    fold(engine, captured, args)
}
