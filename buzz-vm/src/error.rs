//! The VM-surfaced error taxonomy, grounded in chalk's move
//! away from `failure` toward `thiserror`: a closed enum of structured
//! variants rather than a string bag.

use buzz_ir::value::Value;

#[derive(thiserror::Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("{index} is out of bound: {detail}")]
    OutOfBound { index: i64, detail: String },
    #[error("bad number: {0}")]
    BadNumber(String),
    #[error("unexpected null in non-optional context")]
    UnexpectedNull,
    #[error("integer overflow")]
    NumberOverflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("allocation failed: heap exceeds its configured limit")]
    AllocationFailed,
    #[error("{0:?}")]
    Custom(Value),
}

impl RuntimeError {
    /// The value stored on the fiber's exception slot and handed to
    /// `catch` clauses.
    pub fn into_thrown_value(self, intern: impl FnOnce(&str) -> Value) -> Value {
        match self {
            RuntimeError::Custom(v) => v,
            other => intern(&other.to_string()),
        }
    }
}
