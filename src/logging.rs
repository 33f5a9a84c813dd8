//! Structured logging setup
//!
//! Provides JSON-formatted and human-readable logging with optional file
//! output. Console output goes to stderr so command output on stdout stays
//! machine-readable.

use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used for `--verbose`
const VERBOSE_FILTER: &str = "kbsearch=debug";

/// Build the event filter
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output
/// and the configured level applies.
pub fn build_filter(config: &LoggingConfig, verbose: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = if verbose {
        VERBOSE_FILTER
    } else {
        config.level.as_str()
    };
    Ok(EnvFilter::try_new(directive)?)
}

/// Initialize the global subscriber
///
/// # Errors
///
/// Fails if the level directive does not parse, the log file cannot be
/// opened, or a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use kbsearch::config::LoggingConfig;
/// use kbsearch::logging::init_logging;
///
/// init_logging(&LoggingConfig::default(), false).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(config, verbose)?);

    let file = match &config.file_path {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    if config.json_format {
        let stderr_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr);
        let file_layer = file.map(|file| {
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(file)
        });
        registry.with(stderr_layer).with(file_layer).try_init()?;
    } else {
        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);
        let file_layer = file.map(|file| {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(file)
        });
        registry.with(stderr_layer).with(file_layer).try_init()?;
    }

    Ok(())
}
