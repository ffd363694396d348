use thiserror::Error;

use ghr_model::CredentialsError;

use crate::signals::ShutdownSignal;

/// Registration token could not be obtained.
///
/// Network, auth, status and malformed-body failures all collapse into this one error.
#[derive(Debug, Error)]
#[error("registration token unavailable: {reason}")]
pub struct TokenUnavailable {
    pub reason: String,
}

impl TokenUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("{step} exited with code {code}")]
    Failed { step: &'static str, code: i32 },
    #[error("{step} killed by signal {signo}")]
    Killed { step: &'static str, signo: i32 },
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("cleanup guard already holds a registration token")]
    AlreadyArmed,
    #[error("cleanup guard is gone")]
    Detached,
}

/// Fatal outcomes of the runner lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Configuration(#[from] CredentialsError),
    #[error(transparent)]
    TokenUnavailable(#[from] TokenUnavailable),
    #[error("runner {0}")]
    Runner(#[from] RunnerError),
    #[error("cleanup guard: {0}")]
    Guard(#[from] GuardError),
    #[error("interrupted by {0}")]
    Interrupted(ShutdownSignal),
}

impl LifecycleError {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LifecycleError::Configuration(_)
            | LifecycleError::TokenUnavailable(_)
            | LifecycleError::Guard(_) => 1,
            LifecycleError::Runner(RunnerError::Failed { code, .. }) => *code,
            LifecycleError::Runner(RunnerError::Killed { signo, .. }) => 128 + signo,
            LifecycleError::Runner(_) => 1,
            LifecycleError::Interrupted(sig) => sig.exit_code(),
        }
    }
}
