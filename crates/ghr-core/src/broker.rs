use async_trait::async_trait;
use ghr_model::RegistrationToken;

use crate::error::TokenUnavailable;

/// Exchanges a long-lived access token for a registration token.
///
/// One attempt per call. Retrying is the caller's business.
#[async_trait]
pub trait TokenBroker: Send + Sync {
    async fn acquire_registration_token(
        &self,
        access_token: &str,
        repository: &str,
    ) -> Result<RegistrationToken, TokenUnavailable>;
}
