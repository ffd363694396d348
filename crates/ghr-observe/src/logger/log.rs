//! Subscriber assembly: one `EnvFilter` over one output layer, installed globally.
use std::io;

use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::OffsetTime},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

type Filtered = Layered<EnvFilter, Registry>;

pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let base = tracing_subscriber::registry().with(filter(&cfg.level)?);

    match cfg.format {
        LoggerFormat::Text => base
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(cfg.use_color)
                    .with_target(cfg.with_targets)
                    .with_timer(local_rfc3339()),
            )
            .try_init()?,
        LoggerFormat::Json => base
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_ansi(false)
                    .with_target(cfg.with_targets)
                    .with_timer(local_rfc3339()),
            )
            .try_init()?,
        LoggerFormat::Journald => journald(base)?,
    }
    Ok(())
}

fn filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|source| LoggerError::BadFilter {
        directive: directive.to_string(),
        source,
    })
}

/// RFC 3339 timestamps in the local offset, or UTC when it cannot be determined.
fn local_rfc3339() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald(base: Filtered) -> Result<(), LoggerError> {
    let layer = tracing_journald::layer().map_err(LoggerError::Journald)?;
    base.with(layer).try_init()?;
    Ok(())
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald(_base: Filtered) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldUnavailable)
}
