use constraint_domain::{EngineError, Interrupt, ResolveError, ValidationError};
use constraint_types::ids;
use thiserror::Error;

/// Why a client call failed. Failed mutations leave the stores untouched.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("target resolution failed: {0}")]
    Resolve(ResolveError),

    #[error("operation canceled")]
    Canceled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl ClientError {
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Validation(e) => e.code(),
            ClientError::Resolve(_) => ids::CODE_RESOLVE_FAILED,
            ClientError::Canceled => ids::CODE_CANCELED,
            ClientError::DeadlineExceeded => ids::CODE_DEADLINE_EXCEEDED,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

impl From<Interrupt> for ClientError {
    fn from(i: Interrupt) -> Self {
        match i {
            Interrupt::Canceled => ClientError::Canceled,
            Interrupt::DeadlineExceeded => ClientError::DeadlineExceeded,
        }
    }
}

impl From<EngineError> for ClientError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Resolve(r) => ClientError::Resolve(r),
            EngineError::Interrupted(i) => i.into(),
        }
    }
}
