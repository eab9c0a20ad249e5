//! Controller reachability probe.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::channel::Endpoint;
use crate::error::DriverError;

/// How long the probe waits for the TCP connect.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Attempt a short TCP connect to the controller endpoint.
///
/// Execution fails fast with `ConnectionFailed` when this does not succeed;
/// the handshake is never attempted against an unreachable controller.
pub async fn probe_endpoint(endpoint: &Endpoint) -> Result<(), DriverError> {
    let attempt = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
    match timeout(PROBE_TIMEOUT, attempt).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(err)) => {
            tracing::warn!(authority = %endpoint.authority(), error = %err, "reachability probe failed");
            Err(DriverError::ConnectionFailed {
                host: endpoint.host.clone(),
                port: endpoint.port,
            })
        }
        Err(_elapsed) => {
            tracing::warn!(authority = %endpoint.authority(), "reachability probe timed out");
            Err(DriverError::ConnectionFailed {
                host: endpoint.host.clone(),
                port: endpoint.port,
            })
        }
    }
}
