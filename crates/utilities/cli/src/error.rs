//! Error types for CLI utilities.

use std::io;
use thiserror::Error;

/// Errors that can occur while setting up the CLI stack.
#[derive(Debug, Error)]
pub enum CliError {
    /// The metrics address could not be bound.
    #[error("failed to bind metrics address: {0}")]
    MetricsBind(#[from] io::Error),

    /// The Prometheus exporter could not be installed.
    #[error("failed to install prometheus exporter: {0}")]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),

    /// A global tracing subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
}

/// Type alias for CLI results.
pub type CliResult<T> = Result<T, CliError>;
