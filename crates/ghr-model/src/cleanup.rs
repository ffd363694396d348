use crate::RegistrationToken;

/// What the cleanup guard knows at the time it fires.
///
/// Moves from `NoToken` to `HasToken` at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CleanupState {
    #[default]
    NoToken,
    HasToken(RegistrationToken),
}

impl CleanupState {
    pub fn has_token(&self) -> bool {
        matches!(self, CleanupState::HasToken(_))
    }

    pub fn token(&self) -> Option<&RegistrationToken> {
        match self {
            CleanupState::HasToken(t) => Some(t),
            CleanupState::NoToken => None,
        }
    }
}
