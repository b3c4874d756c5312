//! Utilities for spinning up a prometheus metrics server.

use crate::CliResult;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, SocketAddr, TcpListener};
use tracing::info;

/// Starts a Prometheus metrics server on `addr:port`.
///
/// A zero port is resolved to a free port first, so the served address can be logged.
pub fn init_prometheus_server(addr: IpAddr, port: u16) -> CliResult<SocketAddr> {
    let listen_addr = if port == 0 {
        TcpListener::bind((addr, 0))?.local_addr()?
    } else {
        SocketAddr::from((addr, port))
    };

    PrometheusBuilder::new().with_http_listener(listen_addr).install()?;

    info!(target: "prometheus", "Serving metrics at: http://{listen_addr}");
    Ok(listen_addr)
}
