//! Log flags and the tracing subscriber.

use crate::CliResult;
use clap::{ArgAction, Args};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logging arguments.
#[derive(Args, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogArgs {
    /// Verbosity: `-v` warn, `-vv` info, `-vvv` debug, `-vvvv` trace. Defaults to info.
    ///
    /// `RUST_LOG` takes precedence when set.
    #[arg(long = "verbosity", short = 'v', global = true, action = ArgAction::Count)]
    pub v: u8,
    /// Log in JSON.
    #[arg(long = "log.json", global = true, env = "LOG_JSON")]
    pub json: bool,
}

impl LogArgs {
    /// Returns the level selected by the verbosity flags.
    pub const fn level(&self) -> LevelFilter {
        match self.v {
            0 => LevelFilter::INFO,
            1 => LevelFilter::WARN,
            2 => LevelFilter::INFO,
            3 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Installs the global tracing subscriber for `args`.
pub fn init_tracing_subscriber(args: &LogArgs) -> CliResult<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(args.level().into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);
    if args.json {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }
    Ok(())
}
