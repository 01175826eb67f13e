use num_bigint::BigInt;
use num_rational::BigRational;

/// A single stack entry
///
/// Numbers are exact rationals kept in lowest terms with a positive
/// denominator (`BigRational` normalizes on construction). Symbols are plain
/// names without the leading `:` used to write them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Number(BigRational),
    Symbol(String),
}

impl Value {
    /// Integer-valued number
    pub fn int(n: i64) -> Self {
        Value::Number(BigRational::from_integer(BigInt::from(n)))
    }

    #[cfg(test)]
    pub(crate) fn ratio(numer: i64, denom: i64) -> Self {
        Value::Number(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    pub fn as_number(&self) -> Option<&BigRational> {
        match self {
            Value::Number(n) => Some(n),
            Value::Symbol(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            Value::Number(_) => None,
        }
    }
}

impl From<BigRational> for Value {
    fn from(n: BigRational) -> Self {
        Value::Number(n)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Number(BigRational::from_integer(n))
    }
}

/// Base-10 fraction form, for diagnostics. User-facing output goes through
/// [`crate::Engine::display_token`], which honours the current radix.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Symbol(s) => write!(f, ":{}", s),
        }
    }
}

/// Declared category of one operator parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    Symbol,
    Any,
    /// Captures every stack element not claimed by the fixed parameters
    RestOfStack,
}

impl ParamKind {
    /// Whether a single value satisfies this kind. `RestOfStack` is never
    /// checked element-wise.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::Number => matches!(value, Value::Number(_)),
            ParamKind::Symbol => matches!(value, Value::Symbol(_)),
            ParamKind::Any | ParamKind::RestOfStack => true,
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParamKind::Number => "num",
            ParamKind::Symbol => "sym",
            ParamKind::Any => "any",
            ParamKind::RestOfStack => "stack",
        };
        write!(f, "{}", name)
    }
}

/// What an operator hands back to the stack
///
/// `Many` is spread: each element is pushed in order. This is how ranges,
/// `copy`, `swap` and closed scopes deliver several values at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Nothing,
    One(Value),
    Many(Vec<Value>),
}

impl Output {
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Output::Nothing => Vec::new(),
            Output::One(value) => vec![value],
            Output::Many(values) => values,
        }
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Output::One(value)
    }
}

impl From<BigRational> for Output {
    fn from(n: BigRational) -> Self {
        Output::One(Value::Number(n))
    }
}

impl From<Vec<Value>> for Output {
    fn from(values: Vec<Value>) -> Self {
        Output::Many(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_normalized() {
        assert_eq!(Value::ratio(2, 4), Value::ratio(1, 2));
        assert_eq!(Value::ratio(1, -3), Value::ratio(-1, 3));
        assert_eq!(Value::ratio(6, 3), Value::int(2));
    }

    #[test]
    fn test_param_kind_accepts() {
        assert!(ParamKind::Number.accepts(&Value::int(1)));
        assert!(!ParamKind::Number.accepts(&Value::symbol("a")));
        assert!(ParamKind::Symbol.accepts(&Value::symbol("a")));
        assert!(!ParamKind::Symbol.accepts(&Value::int(1)));
        assert!(ParamKind::Any.accepts(&Value::int(1)));
        assert!(ParamKind::Any.accepts(&Value::symbol("a")));
    }

    #[test]
    fn test_output_spreading() {
        assert!(Output::Nothing.into_values().is_empty());
        assert_eq!(Output::from(Value::int(3)).into_values(), vec![Value::int(3)]);
        assert_eq!(
            Output::from(vec![Value::int(1), Value::symbol("x")]).into_values(),
            vec![Value::int(1), Value::symbol("x")]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::ratio(-1, 3).to_string(), "-1/3");
        assert_eq!(Value::symbol("abc").to_string(), ":abc");
        assert_eq!(ParamKind::RestOfStack.to_string(), "stack");
    }
}
