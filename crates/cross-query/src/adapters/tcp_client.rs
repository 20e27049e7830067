//! TCP Endorser Client Adapter
//!
//! Implements `EndorserConnector` over plain TCP with length-prefixed JSON
//! frames. One request/response per connection.

use super::framing::{read_frame, write_frame};
use crate::domain::{EndorserRequest, EndorserResponse};
use crate::ports::outbound::{EndorserChannel, EndorserConnector, TransportError};
use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

/// Opens a new TCP connection for every endorser call.
#[derive(Clone, Debug, Default)]
pub struct TcpConnector;

impl TcpConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EndorserConnector for TcpConnector {
    async fn connect(&self, host: &str) -> Result<Box<dyn EndorserChannel>, TransportError> {
        let stream = TcpStream::connect(host)
            .await
            .map_err(|e| TransportError::Connect(format!("{}: {}", host, e)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::Io(e.to_string()))?;

        debug!(host, "connected to endorser");
        Ok(Box::new(TcpChannel { stream }))
    }
}

/// Open TCP connection to one endorser. Closed when dropped.
pub struct TcpChannel {
    stream: TcpStream,
}

#[async_trait]
impl EndorserChannel for TcpChannel {
    async fn endorser_call(
        &mut self,
        request: EndorserRequest,
    ) -> Result<EndorserResponse, TransportError> {
        write_frame(&mut self.stream, &request).await?;
        read_frame(&mut self.stream).await
    }
}
