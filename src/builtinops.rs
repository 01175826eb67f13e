//! Built-in operator registry.
//!
//! Every operator declares an ordered list of [`ParamKind`]s, bottom of the
//! stack first. The engine pops and type-checks arguments according to that
//! list before the implementation runs, so implementations can pattern-match
//! their argument slices directly.
//!
//! ## Implementation kinds
//!
//! - **Functions** only see their arguments (`+`, `swap`, `range`, ...)
//! - **Commands** also get the engine, for operators that touch the radix,
//!   the display mode, variables, scopes, or that re-enter `parse`
//! - **Collectors** declare one [`ParamKind::RestOfStack`] slot and receive the
//!   captured stack separately from their fixed arguments (`clear`, `map`,
//!   `foldl`, `foldr`)
//!
//! ## Aliases
//!
//! Short names such as `b` or `**` are redirects resolved in a single lookup.
//! An alias that points at another alias does not resolve.
//!
//! ## Adding New Operators
//!
//! 1. Implement the function with the signature matching its [`OpKind`]
//! 2. Add an [`OperatorSpec`] to `BUILTIN_OPS` with its parameter kinds
//! 3. Add any short names to `ALIASES`
//! 4. Add tests, including the type and arity failures

use crate::OperatorError;
use crate::engine::{self, Engine};
use crate::radix::round_to_integer;
use crate::value::{Output, ParamKind, Value};
use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Largest exponent numerator `^` will compute
pub const MAX_POWER: u32 = 1 << 16;

/// Largest root degree `^` will take
pub const MAX_ROOT_DEGREE: u32 = 256;

/// Bound on the bit length of the integer a truncated root is taken of
pub const MAX_ROOT_BITS: u64 = 1 << 18;

/// Most values a single `range` may push
pub const MAX_RANGE_LEN: usize = 1 << 20;

pub type FunctionImpl = fn(&[Value]) -> Result<Output, OperatorError>;
pub type CommandImpl = fn(&mut Engine, &[Value]) -> Result<Output, OperatorError>;
pub type CollectorImpl = fn(&mut Engine, Vec<Value>, &[Value]) -> Result<Output, OperatorError>;

/// Represents the implementation of a built-in operator
#[derive(Clone, Copy)]
pub enum OpKind {
    Function(FunctionImpl),
    Command(CommandImpl),
    /// Receives the captured stack, then the fixed arguments in declaration order
    Collector(CollectorImpl),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::Command(_) => write!(f, "Command(<fn>)"),
            OpKind::Collector(_) => write!(f, "Collector(<fn>)"),
        }
    }
}

/// Definition of a built-in operator
#[derive(Debug, Clone)]
pub struct OperatorSpec {
    pub name: &'static str,
    /// Parameter kinds, bottom of the stack first
    pub params: &'static [ParamKind],
    pub op_kind: OpKind,
}

impl PartialEq for OperatorSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl OperatorSpec {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Index of the `RestOfStack` slot, if any
    pub fn rest_index(&self) -> Option<usize> {
        self.params
            .iter()
            .position(|kind| *kind == ParamKind::RestOfStack)
    }
}

/// Name lookup over a fixed set of operators and aliases
#[derive(Debug)]
pub struct OperatorTable {
    ops: HashMap<&'static str, &'static OperatorSpec>,
    aliases: HashMap<&'static str, &'static str>,
}

impl OperatorTable {
    pub fn new(ops: &'static [OperatorSpec], aliases: &'static [(&'static str, &'static str)]) -> Self {
        OperatorTable {
            ops: ops.iter().map(|op| (op.name, op)).collect(),
            aliases: aliases.iter().copied().collect(),
        }
    }

    /// The shared table of all built-in operators
    pub fn builtin() -> &'static OperatorTable {
        &OPERATOR_TABLE
    }

    /// Find an operator by name, following at most one alias
    pub fn resolve(&self, name: &str) -> Result<&'static OperatorSpec, OperatorError> {
        let target = self.aliases.get(name).copied().unwrap_or(name);
        self.ops
            .get(target)
            .copied()
            .ok_or_else(|| OperatorError::OperatorNotFound(name.to_string()))
    }

    /// Primary operator names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.ops.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Alias names pointing at `target`, sorted
    pub fn aliases_of(&self, target: &str) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .aliases
            .iter()
            .filter(|(_, to)| **to == target)
            .map(|(from, _)| *from)
            .collect();
        names.sort_unstable();
        names
    }
}

//
// Builtin Function Implementations
//

/// Error for an argument slice the declared kinds should have ruled out
fn rejected(args: &[Value], params: &[ParamKind]) -> OperatorError {
    if args.len() != params.len() {
        return OperatorError::arity(params.len(), args.len());
    }
    args.iter()
        .zip(params)
        .find(|(arg, kind)| !kind.accepts(arg))
        .map(|(arg, kind)| OperatorError::TypeMismatch {
            value: arg.to_string(),
            expected: *kind,
        })
        .unwrap_or_else(|| OperatorError::invalid("unexpected arguments"))
}

const NUM: &[ParamKind] = &[ParamKind::Number];
const SYM: &[ParamKind] = &[ParamKind::Symbol];
const ANY: &[ParamKind] = &[ParamKind::Any];
const NUM_NUM: &[ParamKind] = &[ParamKind::Number, ParamKind::Number];
const NUM_NUM_NUM: &[ParamKind] = &[ParamKind::Number, ParamKind::Number, ParamKind::Number];
const ANY_ANY: &[ParamKind] = &[ParamKind::Any, ParamKind::Any];
const REST: &[ParamKind] = &[ParamKind::RestOfStack];
const REST_SYM: &[ParamKind] = &[ParamKind::RestOfStack, ParamKind::Symbol];

// Macro to generate binary operators over two numbers
macro_rules! numeric_binary {
    ($name:ident, |$a:ident, $b:ident| $body:expr) => {
        pub fn $name(args: &[Value]) -> Result<Output, OperatorError> {
            match args {
                [Value::Number($a), Value::Number($b)] => $body,
                _ => Err(rejected(args, NUM_NUM)),
            }
        }
    };
}

numeric_binary!(builtin_add, |a, b| Ok((a + b).into()));
numeric_binary!(builtin_sub, |a, b| Ok((a - b).into()));
numeric_binary!(builtin_mul, |a, b| Ok((a * b).into()));
numeric_binary!(builtin_min, |a, b| Ok(a.min(b).clone().into()));
numeric_binary!(builtin_max, |a, b| Ok(a.max(b).clone().into()));
numeric_binary!(builtin_pow, |a, b| power(a, b).map(Output::from));

numeric_binary!(builtin_div, |a, b| {
    if b.is_zero() {
        Err(OperatorError::DivisionByZero)
    } else {
        Ok((a / b).into())
    }
});

// floored, so the result takes the sign of the divisor
numeric_binary!(builtin_mod, |a, b| {
    if b.is_zero() {
        Err(OperatorError::DivisionByZero)
    } else {
        Ok((a - b * (a / b).floor()).into())
    }
});

/// Exact `base ^ exp`
///
/// A non-integer exponent `p/q` takes the `q`-th root of `base ^ p`. The root
/// is exact when one exists and is otherwise truncated at a binary scale of
/// 2^64.
pub fn power(base: &BigRational, exp: &BigRational) -> Result<BigRational, OperatorError> {
    let numer = exp
        .numer()
        .to_i32()
        .filter(|p| p.unsigned_abs() <= MAX_POWER)
        .ok_or_else(|| OperatorError::invalid("exponent too large"))?;

    if base.is_zero() {
        return match exp.numer().sign() {
            Sign::Minus => Err(OperatorError::DivisionByZero),
            Sign::NoSign => Ok(BigRational::one()),
            Sign::Plus => Ok(BigRational::zero()),
        };
    }
    if exp.is_integer() {
        return Ok(base.pow(numer));
    }
    if base.is_negative() {
        return Err(OperatorError::NonrealResult);
    }

    let degree = exp
        .denom()
        .to_u32()
        .filter(|q| *q <= MAX_ROOT_DEGREE)
        .ok_or_else(|| OperatorError::invalid("root degree too large"))?;
    let value = base.pow(numer);
    let radicand_bits = value.numer().bits()
        + (value.denom().bits() + SCALE_BITS as u64) * u64::from(degree);
    if radicand_bits > MAX_ROOT_BITS {
        return Err(OperatorError::invalid("root too large"));
    }
    Ok(nth_root(&value, degree))
}

const SCALE_BITS: usize = 64;

fn nth_root(value: &BigRational, degree: u32) -> BigRational {
    let (numer, denom) = (value.numer(), value.denom());
    let (root_numer, root_denom) = (numer.nth_root(degree), denom.nth_root(degree));
    if &root_numer.pow(degree) == numer && &root_denom.pow(degree) == denom {
        return BigRational::new(root_numer, root_denom);
    }

    // (n/d)^(1/k) = (n * d^(k-1))^(1/k) / d
    let scale = BigInt::one() << SCALE_BITS;
    let radicand = numer * denom.pow(degree - 1) * scale.pow(degree);
    BigRational::new(radicand.nth_root(degree), denom * scale)
}

pub fn builtin_keep_lower(args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [lower, _] => Ok(lower.clone().into()),
        _ => Err(rejected(args, ANY_ANY)),
    }
}

pub fn builtin_keep_upper(args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [_, upper] => Ok(upper.clone().into()),
        _ => Err(rejected(args, ANY_ANY)),
    }
}

pub fn builtin_copy(args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [value] => Ok(vec![value.clone(), value.clone()].into()),
        _ => Err(rejected(args, ANY)),
    }
}

pub fn builtin_swap(args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [lower, upper] => Ok(vec![upper.clone(), lower.clone()].into()),
        _ => Err(rejected(args, ANY_ANY)),
    }
}

pub fn builtin_chr(args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [Value::Number(n)] => {
            let code = round_to_integer(n);
            code.to_u32()
                .and_then(char::from_u32)
                .map(|c| Output::from(Value::Symbol(c.to_string())))
                .ok_or_else(|| OperatorError::invalid(format!("{} is not a valid code point", code)))
        }
        _ => Err(rejected(args, NUM)),
    }
}

pub fn builtin_ord(args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [Value::Symbol(s)] => Ok(s
            .chars()
            .map(|c| Value::from(BigInt::from(u32::from(c))))
            .collect::<Vec<_>>()
            .into()),
        _ => Err(rejected(args, SYM)),
    }
}

/// Integers from `start` up to but excluding `stop`, stepping by `step`
fn half_open_range(start: BigInt, stop: &BigInt, step: &BigInt) -> Result<Output, OperatorError> {
    if step.is_zero() {
        return Err(OperatorError::invalid("range step must not be zero"));
    }
    let span = if step.is_positive() {
        stop - &start
    } else {
        &start - stop
    };
    let len = if span.is_positive() {
        let step = step.abs();
        (span + &step - 1u32) / step
    } else {
        BigInt::zero()
    };
    let len = len
        .to_usize()
        .filter(|len| *len <= MAX_RANGE_LEN)
        .ok_or_else(|| OperatorError::invalid("range too long"))?;

    let values = std::iter::successors(Some(start), |n| Some(n + step))
        .take(len)
        .map(Value::from)
        .collect::<Vec<_>>();
    Ok(values.into())
}

pub fn builtin_range(args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [Value::Number(from), Value::Number(to)] => half_open_range(
            round_to_integer(from),
            &(round_to_integer(to) + 1u32),
            &BigInt::one(),
        ),
        _ => Err(rejected(args, NUM_NUM)),
    }
}

pub fn builtin_range_step(args: &[Value]) -> Result<Output, OperatorError> {
    match args {
        [Value::Number(from), Value::Number(to), Value::Number(step)] => half_open_range(
            round_to_integer(from),
            &(round_to_integer(to) + 1u32),
            &round_to_integer(step),
        ),
        _ => Err(rejected(args, NUM_NUM_NUM)),
    }
}

pub fn builtin_clear(
    _engine: &mut Engine,
    _captured: Vec<Value>,
    _args: &[Value],
) -> Result<Output, OperatorError> {
    Ok(Output::Nothing)
}

/// Global registry of all built-in operators as a simple array
static BUILTIN_OPS: &[OperatorSpec] = &[
    // Arithmetic
    OperatorSpec {
        name: "+",
        params: NUM_NUM,
        op_kind: OpKind::Function(builtin_add),
    },
    OperatorSpec {
        name: "-",
        params: NUM_NUM,
        op_kind: OpKind::Function(builtin_sub),
    },
    OperatorSpec {
        name: "*",
        params: NUM_NUM,
        op_kind: OpKind::Function(builtin_mul),
    },
    OperatorSpec {
        name: "/",
        params: NUM_NUM,
        op_kind: OpKind::Function(builtin_div),
    },
    OperatorSpec {
        name: "%",
        params: NUM_NUM,
        op_kind: OpKind::Function(builtin_mod),
    },
    OperatorSpec {
        name: "^",
        params: NUM_NUM,
        op_kind: OpKind::Function(builtin_pow),
    },
    OperatorSpec {
        name: "<",
        params: NUM_NUM,
        op_kind: OpKind::Function(builtin_min),
    },
    OperatorSpec {
        name: ">",
        params: NUM_NUM,
        op_kind: OpKind::Function(builtin_max),
    },
    // Stack shuffling
    OperatorSpec {
        name: "<-",
        params: ANY_ANY,
        op_kind: OpKind::Function(builtin_keep_lower),
    },
    OperatorSpec {
        name: "->",
        params: ANY_ANY,
        op_kind: OpKind::Function(builtin_keep_upper),
    },
    OperatorSpec {
        name: "clear",
        params: REST,
        op_kind: OpKind::Collector(builtin_clear),
    },
    OperatorSpec {
        name: "copy",
        params: ANY,
        op_kind: OpKind::Function(builtin_copy),
    },
    OperatorSpec {
        name: "swap",
        params: ANY_ANY,
        op_kind: OpKind::Function(builtin_swap),
    },
    // Engine settings
    OperatorSpec {
        name: "base",
        params: ANY,
        op_kind: OpKind::Command(engine::set_base),
    },
    OperatorSpec {
        name: "frac",
        params: &[],
        op_kind: OpKind::Command(engine::toggle_fraction),
    },
    OperatorSpec {
        name: "eval",
        params: SYM,
        op_kind: OpKind::Command(engine::eval_symbol),
    },
    // Characters and ranges
    OperatorSpec {
        name: "chr",
        params: NUM,
        op_kind: OpKind::Function(builtin_chr),
    },
    OperatorSpec {
        name: "ord",
        params: SYM,
        op_kind: OpKind::Function(builtin_ord),
    },
    OperatorSpec {
        name: "range",
        params: NUM_NUM,
        op_kind: OpKind::Function(builtin_range),
    },
    OperatorSpec {
        name: "range'",
        params: NUM_NUM_NUM,
        op_kind: OpKind::Function(builtin_range_step),
    },
    // Variables
    OperatorSpec {
        name: "set",
        params: ANY_ANY,
        op_kind: OpKind::Command(engine::set_variable),
    },
    OperatorSpec {
        name: "get",
        params: SYM,
        op_kind: OpKind::Command(engine::get_variable),
    },
    // Meta-operators
    OperatorSpec {
        name: "map",
        params: REST_SYM,
        op_kind: OpKind::Collector(engine::map_operator),
    },
    OperatorSpec {
        name: "foldl",
        params: REST_SYM,
        op_kind: OpKind::Collector(engine::fold_left),
    },
    OperatorSpec {
        name: "foldr",
        params: REST_SYM,
        op_kind: OpKind::Collector(engine::fold_right),
    },
    // Scopes
    OperatorSpec {
        name: "(",
        params: &[],
        op_kind: OpKind::Command(engine::open_scope),
    },
    OperatorSpec {
        name: ")",
        params: &[],
        op_kind: OpKind::Command(engine::close_scope),
    },
];

/// Short names, each resolving directly to a primary operator
static ALIASES: &[(&str, &str)] = &[
    ("**", "^"),
    ("b", "base"),
    ("f", "frac"),
    ("c", "clear"),
    ("cp", "copy"),
    ("e", "eval"),
    ("s", "swap"),
    ("r", "range"),
    ("r'", "range'"),
    ("fold", "foldl"),
];

static OPERATOR_TABLE: LazyLock<OperatorTable> =
    LazyLock::new(|| OperatorTable::new(BUILTIN_OPS, ALIASES));

/// Get all builtin operators
pub fn get_builtin_ops() -> &'static [OperatorSpec] {
    BUILTIN_OPS
}

/// Get all builtin aliases as `(alias, target)` pairs
pub fn get_builtin_aliases() -> &'static [(&'static str, &'static str)] {
    ALIASES
}
