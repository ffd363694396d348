mod error;
pub use error::{ExecError, ExecResult};

pub mod owner;
pub use owner::ChownOwner;

pub mod runner;
pub use runner::{ScriptRunner, ScriptRunnerConfig, configure_args};

mod util;

pub mod prelude {
    pub use crate::error::{ExecError, ExecResult};
    pub use crate::{ChownOwner, ScriptRunner, ScriptRunnerConfig};
}
