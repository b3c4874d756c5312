//! Global arguments for the CLI.

use burnwatch_cli::{LogArgs, MetricsArgs};
use clap::Args;

/// Global arguments for the CLI.
#[derive(Args, Default, Clone, Debug)]
pub(crate) struct GlobalArgs {
    /// Logging arguments.
    #[command(flatten)]
    pub(crate) log: LogArgs,
    /// Prometheus CLI arguments.
    #[command(flatten)]
    pub(crate) metrics: MetricsArgs,
}
