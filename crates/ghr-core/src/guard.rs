//! Exit-time cleanup.
//!
//! [`CleanupGuard::install`] is called before the lifecycle takes any side-effecting step.
//! It returns the guard itself, which the supervisor fires on its way out, and a
//! [`GuardHandle`] through which the lifecycle hands over the registration token.
//!
//! The captured [`CleanupState`] lives in a single `watch` slot: one writer (the handle),
//! one reader (the guard). A re-arm replaces the whole value, so the guard never observes a
//! partial update. `fire` consumes the guard, which makes a second run impossible.
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use ghr_model::{CleanupState, RegistrationToken};

use crate::{error::GuardError, runner::DelegatedRunner};

pub struct CleanupGuard {
    state: watch::Receiver<CleanupState>,
    runner: Arc<dyn DelegatedRunner>,
    workdir: PathBuf,
}

/// Write side of the guard state.
pub struct GuardHandle {
    tx: watch::Sender<CleanupState>,
}

impl CleanupGuard {
    pub fn install(
        initial: CleanupState,
        runner: Arc<dyn DelegatedRunner>,
        workdir: impl Into<PathBuf>,
    ) -> (Self, GuardHandle) {
        let (tx, rx) = watch::channel(initial);
        let guard = Self {
            state: rx,
            runner,
            workdir: workdir.into(),
        };
        debug!(target: "ghr.core.guard", workdir = %guard.workdir.display(), "cleanup guard installed");
        (guard, GuardHandle { tx })
    }

    /// Snapshot of the captured state.
    pub fn state(&self) -> CleanupState {
        self.state.borrow().clone()
    }

    /// Run the cleanup: deregister when a token is held, then wipe the work directory.
    ///
    /// Never fails and never panics; every problem is logged and the next step still runs.
    pub async fn fire(self) {
        let state = self.state();
        info!(target: "ghr.core.guard", has_token = state.has_token(), "running cleanup");

        if let CleanupState::HasToken(token) = state {
            deregister(Arc::clone(&self.runner), token).await;
        }

        let failed = clean_workdir(&self.workdir).await;
        if failed > 0 {
            warn!(target: "ghr.core.guard", failed, "work directory cleanup incomplete");
        }
    }
}

impl GuardHandle {
    /// Hand the registration token to the guard.
    ///
    /// Allowed once. The state never goes back to `NoToken`.
    pub fn rearm(&self, token: RegistrationToken) -> Result<(), GuardError> {
        if self.tx.is_closed() {
            return Err(GuardError::Detached);
        }
        let armed = self.tx.send_if_modified(move |state| {
            if state.has_token() {
                return false;
            }
            *state = CleanupState::HasToken(token);
            true
        });
        if !armed {
            return Err(GuardError::AlreadyArmed);
        }
        debug!(target: "ghr.core.guard", "cleanup guard re-armed with registration token");
        Ok(())
    }
}

async fn deregister(runner: Arc<dyn DelegatedRunner>, token: RegistrationToken) {
    let name = runner.name();
    // own task: a panicking backend must not take the directory sweep down with it
    let res = tokio::spawn(async move { runner.remove(&token).await }).await;
    match res {
        Ok(Ok(())) => info!(target: "ghr.core.guard", runner = name, "runner deregistered"),
        Ok(Err(e)) => warn!(target: "ghr.core.guard", runner = name, error = %e, "deregistration failed"),
        Err(e) => warn!(target: "ghr.core.guard", runner = name, error = %e, "deregistration task aborted"),
    }
}

/// Remove the contents of `dir`, keeping `dir` itself.
///
/// Returns the number of entries that could not be removed. A missing directory is not an error.
pub async fn clean_workdir(dir: &Path) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(target: "ghr.core.guard", dir = %dir.display(), "no work directory to clean");
            return 0;
        }
        Err(e) => {
            warn!(target: "ghr.core.guard", dir = %dir.display(), error = %e, "cannot read work directory");
            return 1;
        }
    };

    let mut failed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(target: "ghr.core.guard", dir = %dir.display(), error = %e, "work directory listing failed");
                failed += 1;
                break;
            }
        };
        let path = entry.path();
        if let Err(e) = remove_entry(&path).await {
            warn!(target: "ghr.core.guard", path = %path.display(), error = %e, "cannot remove");
            failed += 1;
        }
    }
    debug!(target: "ghr.core.guard", dir = %dir.display(), failed, "work directory cleaned");
    failed
}

async fn remove_entry(path: &Path) -> io::Result<()> {
    // symlink_metadata: never follow a link out of the work directory
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}
