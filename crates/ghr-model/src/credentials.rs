use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("ACCESS_TOKEN is required")]
    MissingAccessToken,
    #[error("REPOSITORY is required")]
    MissingRepository,
}

/// Long-lived access token and target repository.
///
/// Both values are guaranteed non-empty.
#[derive(Clone)]
pub struct Credentials {
    access_token: String,
    repository: String,
}

impl Credentials {
    pub fn new(
        access_token: Option<String>,
        repository: Option<String>,
    ) -> Result<Self, CredentialsError> {
        let access_token = access_token
            .filter(|s| !s.trim().is_empty())
            .ok_or(CredentialsError::MissingAccessToken)?;
        let repository = repository
            .map(|s| s.trim().trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .ok_or(CredentialsError::MissingRepository)?;

        Ok(Self {
            access_token,
            repository,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Repository in `owner/name` form.
    pub fn repository(&self) -> &str {
        &self.repository
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"***")
            .field("repository", &self.repository)
            .finish()
    }
}
