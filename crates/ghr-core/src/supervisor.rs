use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use ghr_model::{CleanupState, ConfigureOptions, Credentials, NameConfig, RunExit};

use crate::{
    broker::TokenBroker,
    error::LifecycleError,
    guard::{CleanupGuard, GuardHandle},
    identity::generate_identity,
    runner::{DelegatedRunner, WorkspaceOwner},
    signals::{ShutdownSignal, wait_for_shutdown_signal},
};

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub name: NameConfig,
    /// Web base of the CI service; the runner URL is `{server_url}/{repository}`.
    pub server_url: String,
    /// Scratch directory whose contents are wiped on exit.
    pub workdir: PathBuf,
    pub labels: Vec<String>,
    pub runner_group: Option<String>,
    /// Passed as `--work` when set.
    pub work_folder: Option<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            name: NameConfig::default(),
            server_url: "https://github.com".to_string(),
            workdir: PathBuf::from("_work"),
            labels: Vec::new(),
            runner_group: None,
            work_folder: None,
        }
    }
}

/// Drives one ephemeral runner from credentials to teardown.
pub struct Supervisor {
    cfg: SupervisorConfig,
    access_token: Option<String>,
    repository: Option<String>,
    broker: Arc<dyn TokenBroker>,
    runner: Arc<dyn DelegatedRunner>,
    owner: Arc<dyn WorkspaceOwner>,
}

impl Supervisor {
    pub fn new(
        cfg: SupervisorConfig,
        broker: Arc<dyn TokenBroker>,
        runner: Arc<dyn DelegatedRunner>,
        owner: Arc<dyn WorkspaceOwner>,
    ) -> Self {
        Self {
            cfg,
            access_token: None,
            repository: None,
            broker,
            runner,
            owner,
        }
    }

    /// Raw credential values as read from the environment; validated in [`Supervisor::run`].
    pub fn with_credentials(
        mut self,
        access_token: Option<String>,
        repository: Option<String>,
    ) -> Self {
        self.access_token = access_token;
        self.repository = repository;
        self
    }

    /// Run until the delegated runner exits, stopping early on SIGINT/SIGTERM/SIGQUIT.
    ///
    /// Returns the process exit code.
    pub async fn run(self) -> i32 {
        self.run_until(async {
            match wait_for_shutdown_signal().await {
                Ok(sig) => Some(sig),
                Err(e) => {
                    warn!(target: "ghr.core.supervisor", error = %e, "signal handlers unavailable");
                    None
                }
            }
        })
        .await
    }

    /// Like [`Supervisor::run`], with `shutdown` standing in for OS signals.
    ///
    /// `shutdown` resolving to `None` means "no signal will ever come".
    pub async fn run_until<F>(self, shutdown: F) -> i32
    where
        F: Future<Output = Option<ShutdownSignal>> + Send + 'static,
    {
        let Supervisor {
            cfg,
            access_token,
            repository,
            broker,
            runner,
            owner,
        } = self;

        let (guard, handle) =
            CleanupGuard::install(CleanupState::NoToken, Arc::clone(&runner), cfg.workdir.clone());

        let cancel = CancellationToken::new();
        let received = Arc::new(OnceLock::new());
        let listener = {
            let cancel = cancel.clone();
            let received = Arc::clone(&received);
            tokio::spawn(async move {
                if let Some(sig) = shutdown.await {
                    warn!(target: "ghr.core.supervisor", signal = %sig, "termination signal received");
                    let _ = received.set(sig);
                    cancel.cancel();
                }
            })
        };

        let lifecycle = Lifecycle {
            cfg,
            broker,
            runner,
            owner,
            handle,
            cancel,
            received,
        };
        let outcome = tokio::spawn(lifecycle.drive(access_token, repository)).await;
        listener.abort();

        let code = match outcome {
            Ok(Ok(exit)) => {
                info!(target: "ghr.core.supervisor", code = exit.code(), "runner finished");
                exit.code()
            }
            Ok(Err(e)) => {
                error!(target: "ghr.core.supervisor", error = %e, "runner lifecycle failed");
                eprintln!("error: {e}");
                e.exit_code()
            }
            Err(e) => {
                error!(target: "ghr.core.supervisor", error = %e, "runner lifecycle aborted");
                1
            }
        };

        guard.fire().await;
        code
    }
}

struct Lifecycle {
    cfg: SupervisorConfig,
    broker: Arc<dyn TokenBroker>,
    runner: Arc<dyn DelegatedRunner>,
    owner: Arc<dyn WorkspaceOwner>,
    handle: GuardHandle,
    cancel: CancellationToken,
    received: Arc<OnceLock<ShutdownSignal>>,
}

impl Lifecycle {
    #[instrument(level = "debug", name = "lifecycle", skip_all)]
    async fn drive(
        self,
        access_token: Option<String>,
        repository: Option<String>,
    ) -> Result<RunExit, LifecycleError> {
        let creds = Credentials::new(access_token, repository)?;
        info!(target: "ghr.core.supervisor", repository = creds.repository(), "starting ephemeral runner");

        let identity = generate_identity(&self.cfg.name);
        info!(target: "ghr.core.supervisor", name = %identity, "runner identity");

        let token = self
            .interruptible(
                self.broker
                    .acquire_registration_token(creds.access_token(), creds.repository()),
            )
            .await??;
        debug!(target: "ghr.core.supervisor", "registration token acquired");
        let url = format!(
            "{}/{}",
            self.cfg.server_url.trim_end_matches('/'),
            creds.repository()
        );
        drop(creds);

        self.handle.rearm(token.clone())?;

        if let Err(e) = self.interruptible(self.owner.fix_ownership()).await? {
            warn!(target: "ghr.core.supervisor", error = %e, "could not fix workspace ownership");
        }

        let opts = ConfigureOptions {
            labels: self.cfg.labels.clone(),
            runner_group: self.cfg.runner_group.clone(),
            work_folder: self.cfg.work_folder.clone(),
            ..ConfigureOptions::new(url, token, identity)
        };
        self.interruptible(self.runner.configure(&opts)).await??;
        info!(target: "ghr.core.supervisor", runner = self.runner.name(), "runner configured");

        let exit = self.runner.run(self.cancel.clone()).await?;
        Ok(exit)
    }

    /// Await `fut` unless a termination signal arrives first.
    async fn interruptible<T>(&self, fut: impl Future<Output = T>) -> Result<T, LifecycleError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(LifecycleError::Interrupted(self.signal())),
            out = fut => Ok(out),
        }
    }

    fn signal(&self) -> ShutdownSignal {
        self.received
            .get()
            .copied()
            .unwrap_or(ShutdownSignal::Terminate)
    }
}
