use std::{path::PathBuf, process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use ghr_core::{DelegatedRunner, RunnerError};
use ghr_model::{ConfigureOptions, RegistrationToken, RunExit};

use crate::{
    error::{ExecError, ExecResult},
    util::{kill_graceful, redacted, run_exit},
};

/// Location and invocation of the runner's shell entrypoints.
#[derive(Clone, Debug)]
pub struct ScriptRunnerConfig {
    /// Runner install directory; scripts are resolved and executed from here.
    pub root: PathBuf,
    pub configure_script: String,
    pub run_script: String,
    /// Run the scripts through this interpreter instead of executing them directly.
    pub shell: Option<String>,
    /// Variables removed from every child's environment.
    pub scrub_env: Vec<String>,
    /// How long the runner may take to exit after SIGTERM before it is killed; `None` waits forever.
    pub stop_timeout: Option<Duration>,
}

impl Default for ScriptRunnerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            configure_script: "config.sh".to_string(),
            run_script: "run.sh".to_string(),
            shell: None,
            scrub_env: Vec::new(),
            stop_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// [`DelegatedRunner`] over the stock `config.sh` / `run.sh` scripts.
pub struct ScriptRunner {
    name: &'static str,
    cfg: ScriptRunnerConfig,
}

impl ScriptRunner {
    pub fn new(cfg: ScriptRunnerConfig) -> Self {
        Self {
            name: "script",
            cfg,
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    fn command(&self, script: &str, args: &[String]) -> Command {
        let path = self.cfg.root.join(script);
        let mut cmd = match &self.cfg.shell {
            Some(shell) => {
                let mut cmd = Command::new(shell);
                cmd.arg(path);
                cmd
            }
            None => Command::new(path),
        };
        cmd.args(args)
            .current_dir(&self.cfg.root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        for key in &self.cfg.scrub_env {
            cmd.env_remove(key);
        }
        cmd
    }

    /// Run `script` to completion; non-zero exit is an error.
    async fn invoke(&self, step: &'static str, script: &str, args: &[String]) -> ExecResult<()> {
        trace!(target: "ghr.exec.script", step, script, args = ?redacted(args), "spawn");
        let status = self
            .command(script, args)
            .status()
            .await
            .map_err(|e| ExecError::Spawn(format!("{script}: {e}")))?;

        match run_exit(status) {
            RunExit::Exited(0) => {
                debug!(target: "ghr.exec.script", step, "exit success");
                Ok(())
            }
            RunExit::Exited(code) => Err(ExecError::NonZeroExit { step, code }),
            RunExit::Signaled(signo) => Err(ExecError::KilledBySignal { step, signo }),
        }
    }

    async fn run_child(&self, cancel: CancellationToken) -> ExecResult<RunExit> {
        let script = &self.cfg.run_script;
        trace!(target: "ghr.exec.script", step = "run", script, "spawn");
        let mut child = self
            .command(script, &[])
            .spawn()
            .map_err(|e| ExecError::Spawn(format!("{script}: {e}")))?;

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = cancel.cancelled() => {
                debug!(target: "ghr.exec.script", "cancelled; forwarding SIGTERM to runner");
                kill_graceful(&mut child, self.cfg.stop_timeout).await?
            }
        };

        let exit = run_exit(status);
        debug!(target: "ghr.exec.script", code = exit.code(), "runner exited");
        Ok(exit)
    }
}

#[async_trait]
impl DelegatedRunner for ScriptRunner {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn configure(&self, opts: &ConfigureOptions) -> Result<(), RunnerError> {
        let args = configure_args(opts);
        self.invoke("configure", &self.cfg.configure_script, &args)
            .await
            .map_err(RunnerError::from)
    }

    async fn run(&self, cancel: CancellationToken) -> Result<RunExit, RunnerError> {
        self.run_child(cancel).await.map_err(RunnerError::from)
    }

    async fn remove(&self, token: &RegistrationToken) -> Result<(), RunnerError> {
        let args = vec![
            "remove".to_string(),
            "--token".to_string(),
            token.expose_secret().to_string(),
        ];
        self.invoke("remove", &self.cfg.configure_script, &args)
            .await
            .map_err(RunnerError::from)
    }
}

/// Flags of the configure step, in invocation order.
pub fn configure_args(opts: &ConfigureOptions) -> Vec<String> {
    let mut args = vec![
        "--url".to_string(),
        opts.url.clone(),
        "--token".to_string(),
        opts.token.expose_secret().to_string(),
        "--name".to_string(),
        opts.name.to_string(),
        "--ephemeral".to_string(),
        "--unattended".to_string(),
        "--disableupdate".to_string(),
    ];
    if !opts.labels.is_empty() {
        args.push("--labels".to_string());
        args.push(opts.labels.join(","));
    }
    if let Some(group) = &opts.runner_group {
        args.push("--runnergroup".to_string());
        args.push(group.clone());
    }
    if let Some(work) = &opts.work_folder {
        args.push("--work".to_string());
        args.push(work.clone());
    }
    args
}
