mod config;

use std::{
    path::Path,
    process::ExitCode,
    sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use ghr_broker::GithubBroker;
use ghr_core::{Supervisor, clean_workdir, host_id};
use ghr_exec::ScriptRunner;
use ghr_observe::logger_init;

use crate::config::{ACCESS_TOKEN_ENV, Args};

fn main() -> ExitCode {
    // Still single-threaded here: no runtime, no children yet.
    let access_token = take_env(ACCESS_TOKEN_ENV);

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return bootstrap_failed(&config::workdir_from_env());
        }
    };

    let workdir = args.resolved_workdir();
    match run(args, access_token) {
        Ok(code) => ExitCode::from(exit_byte(code)),
        Err(e) => {
            eprintln!("ghr-agentd: {e:#}");
            bootstrap_failed(&workdir)
        }
    }
}

/// Everything before the supervisor owns the guard: logger, runtime, HTTP client.
fn run(args: Args, access_token: Option<String>) -> anyhow::Result<i32> {
    logger_init(&args.logger_config()).context("logger init")?;
    info!("ghr-agentd {}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("tokio runtime")?;

    runtime.block_on(async move {
        let broker = GithubBroker::new(args.broker_config()).context("http client")?;
        let runner = ScriptRunner::new(args.runner_config()).with_name("actions-runner");

        let supervisor = Supervisor::new(
            args.supervisor_config(host_id()),
            Arc::new(broker),
            Arc::new(runner),
            Arc::new(args.owner()),
        )
        .with_credentials(access_token, args.repository.clone());

        anyhow::Ok(supervisor.run().await)
    })
}

/// Directory-only cleanup for failures that happen before the supervisor runs, then exit 1.
fn bootstrap_failed(workdir: &Path) -> ExitCode {
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => {
            let failed = rt.block_on(clean_workdir(workdir));
            if failed > 0 {
                eprintln!("ghr-agentd: {failed} entries left in {}", workdir.display());
            }
        }
        Err(e) => eprintln!("ghr-agentd: cannot clean {}: {e}", workdir.display()),
    }
    ExitCode::FAILURE
}

/// Read `key` and remove it from the process environment.
fn take_env(key: &str) -> Option<String> {
    let value = std::env::var(key).ok();
    // SAFETY: called from `main` before the runtime or any other thread exists.
    unsafe { std::env::remove_var(key) };
    value
}

fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
