use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use ghr_model::{ConfigureOptions, RegistrationToken, RunExit};

use crate::error::RunnerError;

/// Capability over the external runner executable.
///
/// Implementations own the exact command-line syntax; nothing else in the supervisor knows it.
#[async_trait]
pub trait DelegatedRunner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Register the runner with the CI service. Non-zero exit is an error.
    async fn configure(&self, opts: &ConfigureOptions) -> Result<(), RunnerError>;

    /// Start the runner and wait for it.
    ///
    /// When `cancel` fires, the child is asked to terminate and is still awaited;
    /// the returned [`RunExit`] is whatever the child ended with.
    async fn run(&self, cancel: CancellationToken) -> Result<RunExit, RunnerError>;

    /// Deregister the runner using the registration token.
    async fn remove(&self, token: &RegistrationToken) -> Result<(), RunnerError>;
}

/// Hands the runner's files over to the account that executes jobs.
#[async_trait]
pub trait WorkspaceOwner: Send + Sync {
    /// Must be idempotent.
    async fn fix_ownership(&self) -> Result<(), RunnerError>;
}
