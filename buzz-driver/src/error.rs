//! Top-level driver error, carrying the exit code contract: 0 success,
//! 64 compile error, 65 runtime uncaught exception, 70 internal error.

use buzz_ir::value::Value;

#[derive(thiserror::Error, Debug)]
pub enum BuzzError {
    #[error(transparent)]
    Compile(#[from] buzz_solve::CompileError),
    #[error("uncaught exception: {0:?}")]
    Uncaught(Value),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BuzzError {
    pub fn exit_code(&self) -> i32 {
        match self {
            BuzzError::Compile(_) => 64,
            BuzzError::Uncaught(_) => 65,
            BuzzError::Internal(_) => 70,
        }
    }
}
