//! Modbus TCP coil transport.
//!
//! [`TcpCoilTransport`] owns the live connection to the server and performs
//! one "read coils" round trip per call. It never retries internally; the
//! polling loop decides what to do with a failed cycle.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio_modbus::client::{Context, Reader};
use tokio_modbus::prelude::*;
use tracing::debug;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The session dropped or could not be established.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
    /// No response within the configured bound.
    #[error("No response within {0:?}")]
    Timeout(Duration),
    /// Modbus exception response or malformed reply.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// A contiguous block of coil addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoilBlock {
    /// Starting address (0-based).
    pub start: u16,
    /// Number of coils to read.
    pub count: u16,
}

/// One request/response round trip against a connected Modbus server.
///
/// Implementations own the connection exclusively; callers only see ordered
/// bit sequences. Exactly one request is in flight per connection at a time.
pub trait CoilTransport: Send {
    /// Read `block.count` coils starting at `block.start`.
    ///
    /// Returns the bits in server order, truncated to the requested count.
    fn read_coils(
        &mut self,
        block: CoilBlock,
    ) -> impl Future<Output = Result<Vec<bool>, TransportError>> + Send;

    /// Re-establish the connection after a `ConnectionLost` failure.
    fn reconnect(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Coil transport over a Modbus TCP connection.
pub struct TcpCoilTransport {
    ctx: Context,
    addr: SocketAddr,
    timeout: Duration,
}

impl TcpCoilTransport {
    /// Connect to a Modbus TCP server.
    ///
    /// Performed once before polling starts; connection failures surface here,
    /// synchronously, never inside the polling loop.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, TransportError> {
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| TransportError::ConnectionLost(format!("Invalid address: {}", e)))?;

        let ctx = Self::dial(addr, timeout).await?;
        debug!("Connected to Modbus server at {}", addr);

        Ok(Self { ctx, addr, timeout })
    }

    async fn dial(addr: SocketAddr, timeout: Duration) -> Result<Context, TransportError> {
        tokio::time::timeout(timeout, tcp::connect(addr))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(|e| TransportError::ConnectionLost(e.to_string()))
    }
}

impl CoilTransport for TcpCoilTransport {
    async fn read_coils(&mut self, block: CoilBlock) -> Result<Vec<bool>, TransportError> {
        let response = tokio::time::timeout(
            self.timeout,
            self.ctx.read_coils(block.start, block.count),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.timeout))?
        .map_err(|e| TransportError::ConnectionLost(e.to_string()))?
        .map_err(|e| TransportError::Protocol(format!("Exception: {:?}", e)))?;

        // Coils come back packed into bytes; the final byte may carry padding.
        if response.len() < block.count as usize {
            return Err(TransportError::Protocol(format!(
                "Short response: expected {} coils, got {}",
                block.count,
                response.len()
            )));
        }

        let mut bits = response;
        bits.truncate(block.count as usize);
        Ok(bits)
    }

    async fn reconnect(&mut self) -> Result<(), TransportError> {
        debug!("Reconnecting to {}", self.addr);
        self.ctx = Self::dial(self.addr, self.timeout).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // TcpCoilTransport tests require a live Modbus server; the polling loop
    // is exercised against a scripted transport in tests/poller.rs.
}
