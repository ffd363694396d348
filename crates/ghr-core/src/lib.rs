pub mod error;
pub use error::{GuardError, LifecycleError, RunnerError, TokenUnavailable};

pub mod broker;
pub use broker::TokenBroker;

pub mod guard;
pub use guard::{CleanupGuard, GuardHandle, clean_workdir};

pub mod identity;
pub use identity::{DEFAULT_PREFIX, generate_identity, host_id};

pub mod runner;
pub use runner::{DelegatedRunner, WorkspaceOwner};

pub mod signals;
pub use signals::{ShutdownSignal, wait_for_shutdown_signal};

pub mod supervisor;
pub use supervisor::{Supervisor, SupervisorConfig};
