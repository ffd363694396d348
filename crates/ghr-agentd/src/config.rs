use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;

use ghr_broker::BrokerConfig;
use ghr_core::SupervisorConfig;
use ghr_exec::{ChownOwner, ScriptRunnerConfig};
use ghr_model::NameConfig;
use ghr_observe::{LoggerConfig, LoggerFormat};

/// Environment variable holding the access token. Read once, then erased.
pub const ACCESS_TOKEN_ENV: &str = "ACCESS_TOKEN";

const RUNNER_HOME_ENV: &str = "RUNNER_HOME";
const RUNNER_WORKDIR_ENV: &str = "RUNNER_WORKDIR";
const DEFAULT_HOME: &str = ".";
const DEFAULT_WORKDIR: &str = "_work";

/// Ephemeral self-hosted runner supervisor.
///
/// The access token is only accepted through the ACCESS_TOKEN environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "ghr-agentd", version, about, long_about = None)]
pub struct Args {
    /// Target repository, `owner/name`
    #[arg(long, env = "REPOSITORY")]
    pub repository: Option<String>,

    /// Full runner name; overrides prefix, fragment and suffix
    #[arg(long, env = "RUNNER_NAME")]
    pub name: Option<String>,

    /// Runner name prefix
    #[arg(long, env = "RUNNER_NAME_PREFIX")]
    pub name_prefix: Option<String>,

    /// Fragment placed between prefix and host suffix
    #[arg(long, env = "RUNNER_NAME_FRAGMENT")]
    pub name_fragment: Option<String>,

    /// Extra runner labels, comma separated
    #[arg(long, env = "RUNNER_LABELS", value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Runner group to join
    #[arg(long, env = "RUNNER_GROUP")]
    pub runner_group: Option<String>,

    /// Runner install directory (holds config.sh and run.sh)
    #[arg(long, env = RUNNER_HOME_ENV, default_value = DEFAULT_HOME)]
    pub runner_home: PathBuf,

    /// Work directory; relative paths are resolved against the runner home
    #[arg(long, env = RUNNER_WORKDIR_ENV, default_value = DEFAULT_WORKDIR)]
    pub workdir: PathBuf,

    /// Account that owns the runner files
    #[arg(long, env = "RUNNER_USER", default_value = "runner")]
    pub user: String,

    /// Group that owns the runner files
    #[arg(long, env = "RUNNER_USER_GROUP", default_value = "runner")]
    pub user_group: String,

    /// REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Web base URL used for the runner's --url
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "https://github.com")]
    pub server_url: String,

    /// Registration-token request timeout in seconds, 0 to disable
    #[arg(long, env = "TOKEN_TIMEOUT_SECS", default_value_t = 30)]
    pub token_timeout: u64,

    /// Seconds the runner gets to exit after SIGTERM before SIGKILL, 0 to wait forever
    #[arg(long, env = "RUNNER_STOP_TIMEOUT_SECS", default_value_t = 30)]
    pub stop_timeout: u64,

    /// Log filter directive
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format: text, json or journald
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,
}

impl Args {
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            format: self.log_format,
            level: self.log_level.clone(),
            ..Default::default()
        }
    }

    pub fn broker_config(&self) -> BrokerConfig {
        BrokerConfig {
            api_base: self.api_url.clone(),
            timeout_ms: self.token_timeout.saturating_mul(1_000),
            ..Default::default()
        }
    }

    pub fn supervisor_config(&self, host_id: Option<String>) -> SupervisorConfig {
        let labels = self
            .labels
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        SupervisorConfig {
            name: NameConfig {
                full_name: self.name.clone(),
                prefix: self.name_prefix.clone(),
                fragment: self.name_fragment.clone(),
                host_id,
            },
            server_url: self.server_url.clone(),
            workdir: self.resolved_workdir(),
            labels,
            runner_group: self.runner_group.clone(),
            work_folder: self.work_folder(),
        }
    }

    pub fn runner_config(&self) -> ScriptRunnerConfig {
        ScriptRunnerConfig {
            root: self.runner_home.clone(),
            scrub_env: vec![ACCESS_TOKEN_ENV.to_string()],
            stop_timeout: (self.stop_timeout > 0).then(|| Duration::from_secs(self.stop_timeout)),
            ..Default::default()
        }
    }

    pub fn owner(&self) -> ChownOwner {
        ChownOwner::new(&self.runner_home, &self.user, &self.user_group)
    }

    /// `--work` for the runner, only when the work directory differs from the runner's own default.
    fn work_folder(&self) -> Option<String> {
        (self.workdir != Path::new(DEFAULT_WORKDIR))
            .then(|| self.resolved_workdir().display().to_string())
    }

    pub fn resolved_workdir(&self) -> PathBuf {
        resolve_workdir(&self.runner_home, &self.workdir)
    }
}

/// Work directory taken straight from the environment, for when the arguments do not parse.
pub fn workdir_from_env() -> PathBuf {
    let var = |key: &str, default: &str| {
        std::env::var_os(key)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(default))
    };
    resolve_workdir(
        &var(RUNNER_HOME_ENV, DEFAULT_HOME),
        &var(RUNNER_WORKDIR_ENV, DEFAULT_WORKDIR),
    )
}

fn resolve_workdir(home: &Path, workdir: &Path) -> PathBuf {
    if workdir.is_absolute() {
        workdir.to_path_buf()
    } else {
        home.join(workdir)
    }
}
