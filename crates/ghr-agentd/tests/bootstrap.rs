//! Runs the binary with broken configuration and checks that the work directory is still swept.

use std::{path::Path, process::Command};

use tempfile::TempDir;

fn runner_home() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(home.path().join("_work/job")).unwrap();
    std::fs::write(home.path().join("_work/stale.log"), b"previous job").unwrap();
    std::fs::write(home.path().join("_work/job/out.txt"), b"x").unwrap();
    home
}

fn agentd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ghr-agentd"));
    cmd.env_clear()
        .env("RUNNER_HOME", home)
        .env("REPOSITORY", "octo/hello");
    cmd
}

fn assert_swept(home: &Path) {
    let work = home.join("_work");
    assert!(work.is_dir(), "work directory itself is kept");
    assert_eq!(std::fs::read_dir(&work).unwrap().count(), 0);
}

#[test]
fn bad_log_level_exits_1_and_cleans() {
    let home = runner_home();
    let out = agentd(home.path())
        .env("ACCESS_TOKEN", "ghp_x")
        .env("LOG_LEVEL", "ghr=notalevel")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert_swept(home.path());
}

#[test]
fn bad_log_format_exits_1_and_cleans() {
    let home = runner_home();
    let out = agentd(home.path())
        .env("ACCESS_TOKEN", "ghp_x")
        .env("LOG_FORMAT", "yaml")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert_swept(home.path());
}

#[test]
fn bad_token_timeout_exits_1_and_cleans() {
    let home = runner_home();
    let out = agentd(home.path())
        .env("ACCESS_TOKEN", "ghp_x")
        .env("TOKEN_TIMEOUT_SECS", "soon")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert_swept(home.path());
}

#[test]
fn missing_access_token_exits_1_and_cleans() {
    let home = runner_home();
    let out = agentd(home.path()).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert_swept(home.path());
}

#[test]
fn custom_workdir_is_swept_when_args_fail() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    std::fs::write(work.path().join("stale.log"), b"x").unwrap();

    let out = agentd(home.path())
        .env("RUNNER_WORKDIR", work.path())
        .env("LOG_FORMAT", "yaml")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[test]
fn help_exits_0_and_touches_nothing() {
    let home = runner_home();
    let out = agentd(home.path()).arg("--help").output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(home.path().join("_work/stale.log").exists());
}
