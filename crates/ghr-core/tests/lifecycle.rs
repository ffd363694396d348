use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use ghr_core::{
    DelegatedRunner, RunnerError, ShutdownSignal, Supervisor, SupervisorConfig, TokenBroker,
    TokenUnavailable, WorkspaceOwner,
};
use ghr_model::{ConfigureOptions, NameConfig, RegistrationToken, RunExit};

#[derive(Default)]
struct FakeBroker {
    calls: Mutex<Vec<(String, String)>>,
    empty: bool,
    hang: bool,
}

#[async_trait]
impl TokenBroker for FakeBroker {
    async fn acquire_registration_token(
        &self,
        access_token: &str,
        repository: &str,
    ) -> Result<RegistrationToken, TokenUnavailable> {
        self.calls
            .lock()
            .unwrap()
            .push((access_token.to_string(), repository.to_string()));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.empty {
            return Err(TokenUnavailable::new("response carried no token"));
        }
        Ok(RegistrationToken::new("REG-TOKEN").unwrap())
    }
}

#[derive(Default)]
struct FakeRunner {
    events: Mutex<Vec<String>>,
    configured: Mutex<Option<ConfigureOptions>>,
    exit_code: i32,
    configure_fails: bool,
    wait_for_cancel: bool,
    panic_on_run: bool,
}

impl FakeRunner {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, e: impl Into<String>) {
        self.events.lock().unwrap().push(e.into());
    }
}

#[async_trait]
impl DelegatedRunner for FakeRunner {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn configure(&self, opts: &ConfigureOptions) -> Result<(), RunnerError> {
        self.push("configure");
        *self.configured.lock().unwrap() = Some(opts.clone());
        if self.configure_fails {
            return Err(RunnerError::Failed {
                step: "configure",
                code: 2,
            });
        }
        Ok(())
    }

    async fn run(&self, cancel: CancellationToken) -> Result<RunExit, RunnerError> {
        self.push("run");
        if self.panic_on_run {
            panic!("runner backend bug");
        }
        if self.wait_for_cancel {
            cancel.cancelled().await;
            return Ok(RunExit::Signaled(15));
        }
        Ok(RunExit::Exited(self.exit_code))
    }

    async fn remove(&self, token: &RegistrationToken) -> Result<(), RunnerError> {
        self.push(format!("remove {}", token.expose_secret()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeOwner {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl WorkspaceOwner for FakeOwner {
    async fn fix_ownership(&self) -> Result<(), RunnerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RunnerError::Failed {
                step: "chown",
                code: 1,
            });
        }
        Ok(())
    }
}

struct Harness {
    broker: Arc<FakeBroker>,
    runner: Arc<FakeRunner>,
    owner: Arc<FakeOwner>,
    workdir: tempfile::TempDir,
}

impl Harness {
    fn new(broker: FakeBroker, runner: FakeRunner, owner: FakeOwner) -> Self {
        let workdir = tempfile::tempdir().unwrap();
        std::fs::write(workdir.path().join("leftover.log"), b"x").unwrap();
        std::fs::create_dir_all(workdir.path().join("widgets/widgets")).unwrap();
        Self {
            broker: Arc::new(broker),
            runner: Arc::new(runner),
            owner: Arc::new(owner),
            workdir,
        }
    }

    fn supervisor(&self, access_token: Option<&str>, repository: Option<&str>) -> Supervisor {
        let cfg = SupervisorConfig {
            name: NameConfig {
                host_id: Some("box42".into()),
                ..Default::default()
            },
            workdir: self.workdir.path().to_path_buf(),
            ..Default::default()
        };
        Supervisor::new(
            cfg,
            self.broker.clone(),
            self.runner.clone(),
            self.owner.clone(),
        )
        .with_credentials(
            access_token.map(String::from),
            repository.map(String::from),
        )
    }

    async fn run(&self, access_token: Option<&str>, repository: Option<&str>) -> i32 {
        self.supervisor(access_token, repository)
            .run_until(std::future::pending())
            .await
    }

    fn broker_calls(&self) -> usize {
        self.broker.calls.lock().unwrap().len()
    }

    fn workdir_is_empty(&self) -> bool {
        is_empty_dir(self.workdir.path())
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    dir.is_dir() && std::fs::read_dir(dir).unwrap().next().is_none()
}

fn signal_after(ms: u64, sig: ShutdownSignal) -> impl Future<Output = Option<ShutdownSignal>> {
    async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Some(sig)
    }
}

#[tokio::test]
async fn happy_path_registers_runs_and_deregisters() {
    let h = Harness::new(FakeBroker::default(), FakeRunner::default(), FakeOwner::default());

    let code = h.run(Some("ghp_access"), Some("acme/widgets")).await;

    assert_eq!(code, 0);
    assert_eq!(
        *h.broker.calls.lock().unwrap(),
        vec![("ghp_access".to_string(), "acme/widgets".to_string())]
    );
    assert_eq!(h.owner.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.runner.events(),
        vec!["configure", "run", "remove REG-TOKEN"]
    );

    let opts = h.runner.configured.lock().unwrap().clone().unwrap();
    assert_eq!(opts.name.as_str(), "github-runner-box42");
    assert_eq!(opts.url, "https://github.com/acme/widgets");
    assert_eq!(opts.token.expose_secret(), "REG-TOKEN");
    assert!(h.workdir_is_empty());
}

#[tokio::test]
async fn missing_access_token_exits_one_without_side_effects() {
    let h = Harness::new(FakeBroker::default(), FakeRunner::default(), FakeOwner::default());

    let code = h.run(None, Some("acme/widgets")).await;

    assert_eq!(code, 1);
    assert_eq!(h.broker_calls(), 0);
    assert!(h.runner.events().is_empty());
    assert_eq!(h.owner.calls.load(Ordering::SeqCst), 0);
    assert!(h.workdir_is_empty());
}

#[tokio::test]
async fn empty_repository_exits_one() {
    let h = Harness::new(FakeBroker::default(), FakeRunner::default(), FakeOwner::default());

    assert_eq!(h.run(Some("ghp_access"), Some("")).await, 1);
    assert_eq!(h.broker_calls(), 0);
    assert!(h.runner.events().is_empty());
}

#[tokio::test]
async fn token_unavailable_exits_one_with_directory_only_cleanup() {
    let broker = FakeBroker {
        empty: true,
        ..Default::default()
    };
    let h = Harness::new(broker, FakeRunner::default(), FakeOwner::default());

    let code = h.run(Some("ghp_access"), Some("acme/widgets")).await;

    assert_eq!(code, 1);
    assert_eq!(h.broker_calls(), 1);
    assert!(h.runner.events().is_empty());
    assert!(h.workdir_is_empty());
}

#[tokio::test]
async fn runner_exit_code_is_propagated() {
    let runner = FakeRunner {
        exit_code: 3,
        ..Default::default()
    };
    let h = Harness::new(FakeBroker::default(), runner, FakeOwner::default());

    assert_eq!(h.run(Some("ghp_access"), Some("acme/widgets")).await, 3);
    assert_eq!(
        h.runner.events(),
        vec!["configure", "run", "remove REG-TOKEN"]
    );
}

#[tokio::test]
async fn failed_configure_still_deregisters() {
    let runner = FakeRunner {
        configure_fails: true,
        ..Default::default()
    };
    let h = Harness::new(FakeBroker::default(), runner, FakeOwner::default());

    assert_eq!(h.run(Some("ghp_access"), Some("acme/widgets")).await, 2);
    assert_eq!(h.runner.events(), vec!["configure", "remove REG-TOKEN"]);
    assert!(h.workdir_is_empty());
}

#[tokio::test]
async fn ownership_failure_is_not_fatal() {
    let owner = FakeOwner {
        fail: true,
        ..Default::default()
    };
    let h = Harness::new(FakeBroker::default(), FakeRunner::default(), owner);

    assert_eq!(h.run(Some("ghp_access"), Some("acme/widgets")).await, 0);
    assert_eq!(
        h.runner.events(),
        vec!["configure", "run", "remove REG-TOKEN"]
    );
}

#[tokio::test]
async fn signal_during_run_is_forwarded_and_cleans_up() {
    let runner = FakeRunner {
        wait_for_cancel: true,
        ..Default::default()
    };
    let h = Harness::new(FakeBroker::default(), runner, FakeOwner::default());

    let code = h
        .supervisor(Some("ghp_access"), Some("acme/widgets"))
        .run_until(signal_after(20, ShutdownSignal::Terminate))
        .await;

    assert_eq!(code, 143);
    assert_eq!(
        h.runner.events(),
        vec!["configure", "run", "remove REG-TOKEN"]
    );
    assert!(h.workdir_is_empty());
}

#[tokio::test]
async fn signal_before_token_skips_deregistration() {
    let broker = FakeBroker {
        hang: true,
        ..Default::default()
    };
    let h = Harness::new(broker, FakeRunner::default(), FakeOwner::default());

    let code = h
        .supervisor(Some("ghp_access"), Some("acme/widgets"))
        .run_until(signal_after(20, ShutdownSignal::Interrupt))
        .await;

    assert_eq!(code, 130);
    assert!(h.runner.events().is_empty());
    assert!(h.workdir_is_empty());
}

#[tokio::test]
async fn panic_in_lifecycle_still_deregisters() {
    let runner = FakeRunner {
        panic_on_run: true,
        ..Default::default()
    };
    let h = Harness::new(FakeBroker::default(), runner, FakeOwner::default());

    assert_eq!(h.run(Some("ghp_access"), Some("acme/widgets")).await, 1);
    assert_eq!(
        h.runner.events(),
        vec!["configure", "run", "remove REG-TOKEN"]
    );
    assert!(h.workdir_is_empty());
}
