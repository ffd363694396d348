//! Runner display-name generation.
//!
//! Priority: explicit full name, then `prefix[-fragment]-suffix`, where the
//! suffix is the host identifier or, when that is missing, 12 random hex chars.
//! The result is cut to [`MAX_IDENTITY_LEN`] bytes; overlong input is never an error.
use std::fmt::Write;

use ghr_model::{MAX_IDENTITY_LEN, NameConfig, RunnerIdentity};
use tracing::debug;

pub const DEFAULT_PREFIX: &str = "github-runner";

const RANDOM_SUFFIX_BYTES: usize = 6;

/// Derive the runner name from `cfg`.
pub fn generate_identity(cfg: &NameConfig) -> RunnerIdentity {
    if let Some(full) = non_empty(&cfg.full_name)
        && let Some(id) = RunnerIdentity::new(full)
    {
        debug!(target: "ghr.core.identity", name = %id, "using full-name override");
        return id;
    }

    let prefix = non_empty(&cfg.prefix).unwrap_or(DEFAULT_PREFIX);
    let suffix = match non_empty(&cfg.host_id) {
        Some(host) => host.to_string(),
        None => random_suffix(),
    };

    let mut name = String::with_capacity(MAX_IDENTITY_LEN);
    name.push_str(prefix);
    if let Some(fragment) = non_empty(&cfg.fragment) {
        name.push('-');
        name.push_str(fragment);
    }
    name.push('-');
    name.push_str(&suffix);

    RunnerIdentity::new(name).expect("composed runner name always starts with a prefix")
}

/// Host identifier of this machine, if it has a usable one.
pub fn host_id() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

/// 12 lowercase hex chars drawn from the OS random source.
fn random_suffix() -> String {
    let id = uuid::Uuid::new_v4();
    let mut out = String::with_capacity(RANDOM_SUFFIX_BYTES * 2);
    for b in &id.as_bytes()[..RANDOM_SUFFIX_BYTES] {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
