use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use ghr_core::{RunnerError, WorkspaceOwner};

use crate::{
    error::ExecError,
    util::{is_root, run_exit},
};

/// Recursively chowns the runner directory, going through `sudo -n` unless already root.
#[derive(Clone, Debug)]
pub struct ChownOwner {
    pub path: PathBuf,
    pub user: String,
    pub group: String,
}

impl ChownOwner {
    pub fn new(path: impl Into<PathBuf>, user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            user: user.into(),
            group: group.into(),
        }
    }

    fn command(&self, as_root: bool) -> Command {
        let mut cmd = if as_root {
            Command::new("chown")
        } else {
            let mut sudo = Command::new("sudo");
            sudo.arg("-n").arg("chown");
            sudo
        };
        cmd.arg("-R")
            .arg(format!("{}:{}", self.user, self.group))
            .arg(&self.path)
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl WorkspaceOwner for ChownOwner {
    async fn fix_ownership(&self) -> Result<(), RunnerError> {
        let as_root = is_root();
        debug!(
            target: "ghr.exec.owner",
            path = %self.path.display(),
            user = %self.user,
            group = %self.group,
            as_root,
            "fixing ownership"
        );
        let status = self
            .command(as_root)
            .status()
            .await
            .map_err(|e| ExecError::Spawn(format!("chown: {e}")))?;

        let exit = run_exit(status);
        if !exit.success() {
            return Err(ExecError::NonZeroExit {
                step: "chown",
                code: exit.code(),
            }
            .into());
        }
        Ok(())
    }
}
