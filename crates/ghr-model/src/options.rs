use crate::{RegistrationToken, RunnerIdentity};

/// Arguments of the delegated runner's configure step.
///
/// Ephemeral, unattended and auto-update-disabled are implied and not configurable.
#[derive(Debug, Clone)]
pub struct ConfigureOptions {
    /// Repository web URL, e.g. `https://github.com/acme/widgets`.
    pub url: String,
    pub token: RegistrationToken,
    pub name: RunnerIdentity,
    pub labels: Vec<String>,
    pub runner_group: Option<String>,
    pub work_folder: Option<String>,
}

impl ConfigureOptions {
    pub fn new(url: impl Into<String>, token: RegistrationToken, name: RunnerIdentity) -> Self {
        Self {
            url: url.into(),
            token,
            name,
            labels: Vec::new(),
            runner_group: None,
            work_folder: None,
        }
    }
}
