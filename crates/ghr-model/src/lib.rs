//! Plain data types shared by the runner supervisor crates.
mod cleanup;
pub use cleanup::CleanupState;

mod credentials;
pub use credentials::{Credentials, CredentialsError};

mod identity;
pub use identity::{MAX_IDENTITY_LEN, NameConfig, RunnerIdentity, truncate_to};

mod options;
pub use options::ConfigureOptions;

mod token;
pub use token::RegistrationToken;

mod process;
pub use process::RunExit;
