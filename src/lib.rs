//! Exact-rational RPN calculator engine.
//!
//! Tokens are fed one at a time to [`Engine::parse`], which classifies each one
//! as a numeric literal, a symbol literal (`:name`), a macro (sugared suffixes
//! and prefixes such as `+$` or `x=`) or an operator name, and mutates the
//! engine's stack accordingly.
//!
//! ```
//! use rpncalc::Engine;
//!
//! let mut engine = Engine::new();
//! for token in "1 2 3 +$ 4 /".split_whitespace() {
//!     engine.parse(token).unwrap();
//! }
//! assert_eq!(engine.display_stack(), vec!["3/2"]);
//! ```
//!
//! All arithmetic is exact. Numbers are read and written in the engine's
//! current radix (2 to 36), either as fractions or as truncated radix-point
//! expansions.

use crate::value::ParamKind;
use thiserror::Error;

/// Reason a radix could not be selected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaseError {
    #[error("radix too small")]
    TooSmall,
    #[error("radix too large")]
    TooLarge,
    #[error("base name \"{0}\" not found")]
    UnknownName(String),
}

/// Error types for the engine
///
/// Every failure is recoverable at the statement boundary. The engine does not
/// roll back stack mutations made before the failure was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorError {
    #[error("operator not found")]
    OperatorNotFound(String),
    #[error("expected {expected} arguments, got {got}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("{value} is not of type {expected}")]
    TypeMismatch { value: String, expected: ParamKind },
    #[error("division by zero")]
    DivisionByZero,
    #[error("{0}")]
    InvalidBase(BaseError),
    #[error("cannot close the outermost scope")]
    ScopeUnderflow,
    #[error("variable \"{0}\" is not set")]
    UnboundVariable(String),
    #[error("result is not a real number")]
    NonrealResult,
    #[error("expansion nested deeper than {limit} levels")]
    MacroExpansionTooDeep { limit: usize },
    #[error("{0}")]
    InvalidArgument(String),
}

impl OperatorError {
    pub fn arity(expected: usize, got: usize) -> Self {
        OperatorError::ArityMismatch { expected, got }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        OperatorError::InvalidArgument(reason.into())
    }
}

pub mod builtinops;
pub mod engine;
pub mod environment;
pub mod macros;
pub mod radix;
pub mod scope;
pub mod session;
pub mod value;

pub use engine::{Engine, EngineConfig};
pub use session::{LineReport, OutputStyle, Session, tokenize};
pub use value::{Output, Value};
