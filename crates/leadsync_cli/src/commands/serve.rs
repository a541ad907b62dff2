//! HTTP server command.

use leadsync_engine::{SyncConfig, SyncService};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Serves the health/trigger endpoints until the process is stopped.
pub fn run(config: &SyncConfig, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let ip: IpAddr = host.parse()?;
    let addr = SocketAddr::from((ip, port));

    let service = Arc::new(SyncService::over_rest(config));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(leadsync_server::serve(service, addr))?;
    Ok(())
}
