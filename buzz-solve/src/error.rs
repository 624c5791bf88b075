use buzz_ir::placeholder::SourceLocation;

/// A compile-time failure.
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("placeholder declared at {0:?} was never resolved")]
    UnresolvedPlaceholder(SourceLocation),
    #[error("placeholder at {0:?} would link to itself")]
    SelfReferentialPlaceholder(SourceLocation),
    #[error("placeholder at {0:?} resolves back to itself through a relation cycle")]
    PlaceholderCycle(SourceLocation),
}

impl From<buzz_ir::IrError> for CompileError {
    fn from(e: buzz_ir::IrError) -> Self {
        match e {
            buzz_ir::IrError::UnresolvedPlaceholder(loc) => CompileError::UnresolvedPlaceholder(loc),
            buzz_ir::IrError::SelfReferentialPlaceholder(loc) => {
                CompileError::SelfReferentialPlaceholder(loc)
            }
            buzz_ir::IrError::PlaceholderCycle(loc) => CompileError::PlaceholderCycle(loc),
        }
    }
}
