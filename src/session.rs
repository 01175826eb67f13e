//! Line-level driver around an [`Engine`].
//!
//! A line is split into `;`-separated statements after dropping any `#`
//! comment. Each statement runs against a snapshot of the open stacks; the
//! first failing token aborts the statement and restores the snapshot, scope
//! nesting included. Later statements on the same line still run.

use crate::OperatorError;
use crate::engine::Engine;
use crate::radix;
use num_bigint::BigInt;
use tracing::debug;

/// Statements of `line`, each as its whitespace-separated tokens
pub fn tokenize(line: &str) -> Vec<Vec<&str>> {
    let code = line.split('#').next().unwrap_or_default();
    code.split(';')
        .map(|statement| statement.split_whitespace().collect())
        .collect()
}

/// How a statement's resulting stack is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// `=<stack>\t(<radix - 1>+1)`
    #[default]
    Full,
    /// The stack alone
    Simple,
}

/// The token a statement stopped at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub error: OperatorError,
    pub token: String,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!{} (in \"{}\")", self.error, self.token)
    }
}

/// Outcome of one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementReport {
    /// Current stack afterwards, as display tokens
    pub stack: Vec<String>,
    /// The radix written as `<radix - 1 in that radix>+1`, e.g. `9+1`
    pub radix_label: String,
    pub failure: Option<Failure>,
}

impl StatementReport {
    pub fn render(&self, style: OutputStyle) -> String {
        let stack = self.stack.join(" ");
        let result = match style {
            OutputStyle::Full => format!("={}\t({})", stack, self.radix_label),
            OutputStyle::Simple => stack,
        };
        match &self.failure {
            Some(failure) => format!("{}\n{}", failure, result),
            None => result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineReport {
    pub statements: Vec<StatementReport>,
}

impl LineReport {
    pub fn failures(&self) -> impl Iterator<Item = &Failure> {
        self.statements.iter().filter_map(|s| s.failure.as_ref())
    }

    pub fn is_ok(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Stack after the last statement
    pub fn final_stack(&self) -> Option<&[String]> {
        self.statements.last().map(|s| s.stack.as_slice())
    }

    pub fn render(&self, style: OutputStyle) -> String {
        self.statements
            .iter()
            .map(|statement| statement.render(style))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    engine: Engine,
}

impl Session {
    pub fn new(engine: Engine) -> Self {
        Session { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn run_line(&mut self, line: &str) -> LineReport {
        let statements = tokenize(line)
            .into_iter()
            .map(|tokens| self.run_statement(&tokens))
            .collect();
        LineReport { statements }
    }

    fn run_statement(&mut self, tokens: &[&str]) -> StatementReport {
        let snapshot = self.engine.scopes().clone();
        let failure = tokens.iter().find_map(|token| {
            let error = self.engine.parse(token).err()?;
            debug!(token, %error, "statement failed");
            Some(Failure {
                error,
                token: token.to_string(),
            })
        });
        if failure.is_some() {
            self.engine.restore_scopes(snapshot);
        }
        StatementReport {
            stack: self.engine.display_stack(),
            radix_label: self.radix_label(),
            failure,
        }
    }

    fn radix_label(&self) -> String {
        let radix = self.engine.radix();
        let top_digit = BigInt::from(radix.get() - 1);
        format!("{}+1", radix::format_integer(&top_digit, radix))
    }
}
