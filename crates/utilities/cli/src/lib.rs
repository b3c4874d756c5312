//! Shared CLI plumbing of the burnwatch binaries: log and metrics flags, the tracing subscriber
//! and the Prometheus exporter.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::{CliError, CliResult};

mod log;
pub use log::{LogArgs, init_tracing_subscriber};

mod metrics_args;
pub use metrics_args::MetricsArgs;

mod prometheus;
pub use prometheus::init_prometheus_server;

mod styles;
pub use styles::cli_styles;
