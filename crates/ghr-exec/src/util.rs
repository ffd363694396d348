use std::{process::ExitStatus, time::Duration};

use tokio::process::Child;
use tracing::warn;

use ghr_model::RunExit;

pub fn run_exit(status: ExitStatus) -> RunExit {
    if let Some(code) = status.code() {
        return RunExit::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signo) = status.signal() {
            return RunExit::Signaled(signo);
        }
    }
    RunExit::Exited(1)
}

/// Ask the child to terminate (SIGTERM) without waiting for it.
#[cfg(unix)]
pub fn forward_terminate(child: &mut Child) -> std::io::Result<()> {
    let Some(id) = child.id() else {
        // already reaped
        return Ok(());
    };
    let rc = unsafe { libc::kill(id as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn forward_terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}

/// SIGTERM the child and wait for it; SIGKILL once `grace` runs out.
///
/// `None` waits without a bound.
pub async fn kill_graceful(child: &mut Child, grace: Option<Duration>) -> std::io::Result<ExitStatus> {
    if let Err(e) = forward_terminate(child) {
        warn!(target: "ghr.exec.script", error = %e, "could not signal runner");
    }
    let Some(grace) = grace else {
        return child.wait().await;
    };
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(target: "ghr.exec.script", grace_ms = grace.as_millis() as u64, "runner ignored SIGTERM; killing");
            child.kill().await?;
            child.wait().await
        }
    }
}

#[cfg(unix)]
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Args with the value following `--token` masked, for logging.
pub fn redacted(args: &[String]) -> Vec<&str> {
    let mut out = Vec::with_capacity(args.len());
    let mut hide_next = false;
    for a in args {
        if hide_next {
            out.push("***");
            hide_next = false;
            continue;
        }
        hide_next = a == "--token";
        out.push(a.as_str());
    }
    out
}
