//! Prometheus metrics flags.

use crate::{CliResult, init_prometheus_server};
use clap::Args;
use std::net::IpAddr;

/// Configuration of the Prometheus exporter.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Serve Prometheus metrics.
    #[arg(long = "metrics.enabled", global = true, env = "METRICS_ENABLED")]
    pub enabled: bool,
    /// Address the metrics server listens on.
    #[arg(long = "metrics.addr", global = true, default_value = "0.0.0.0", env = "METRICS_ADDR")]
    pub addr: IpAddr,
    /// Port the metrics server listens on. Zero picks a free port.
    #[arg(long = "metrics.port", global = true, default_value_t = 9090, env = "METRICS_PORT")]
    pub port: u16,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self { enabled: false, addr: IpAddr::from([0, 0, 0, 0]), port: 9090 }
    }
}

impl MetricsArgs {
    /// Starts the Prometheus server if enabled.
    ///
    /// Returns whether metrics are served.
    pub fn init(&self) -> CliResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        init_prometheus_server(self.addr, self.port)?;
        Ok(true)
    }
}
