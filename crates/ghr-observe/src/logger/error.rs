use thiserror::Error;
use tracing_subscriber::{filter::ParseError, util::TryInitError};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format `{0}`, expected text, json or journald")]
    UnknownFormat(String),
    #[error("journald logging needs Linux and the `journald` feature")]
    JournaldUnavailable,
    #[error("bad log filter `{directive}`: {source}")]
    BadFilter {
        directive: String,
        source: ParseError,
    },
    #[error("cannot connect to journald: {0}")]
    Journald(#[source] std::io::Error),
    #[error("cannot install log subscriber: {0}")]
    Install(#[from] TryInitError),
}
