use thiserror::Error;

use ghr_core::RunnerError;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("{step}: non-zero exit code: {code}")]
    NonZeroExit { step: &'static str, code: i32 },
    #[error("{step}: killed by signal {signo}")]
    KilledBySignal { step: &'static str, signo: i32 },
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}

impl From<ExecError> for RunnerError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::NonZeroExit { step, code } => RunnerError::Failed { step, code },
            ExecError::KilledBySignal { step, signo } => RunnerError::Killed { step, signo },
            ExecError::Spawn(msg) => RunnerError::Spawn(msg),
            ExecError::Io(msg) => RunnerError::Io(msg),
        }
    }
}
