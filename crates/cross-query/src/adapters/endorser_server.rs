//! Endorser Server Adapter
//!
//! The endorser side of the protocol: accepts TCP connections, replays each
//! query through an [`EndorsementHandler`], and answers with an
//! [`EndorsedPayload`] signed over the same digest clients verify.
//!
//! Handler or decode failures close the connection without an answer; the
//! client sees the endorser as unreachable. A connection that sends no
//! request within the read timeout is closed the same way, and shutdown
//! aborts every connection still in flight.

use super::crypto::Secp256k1Provider;
use super::framing::{read_frame, write_frame};
use crate::algorithms::endorsement_digest;
use crate::domain::{
    CrossQueryRequest, CrossQueryResponse, EndorsedPayload, EndorserRequest, EndorserResponse,
    QueryKind, QueryRequest, QueryResponse, SignatureInfo, TxRecord, TxStatusRequest,
};
use crate::ports::outbound::TransportError;
use async_trait::async_trait;
use shared_crypto::{CryptoError, Secp256k1KeyPair};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// How long a connection may take to deliver its request frame.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while endorsing one request.
#[derive(Debug, Error)]
pub enum EndorseError {
    /// `request_name` is neither `CrossQueryPreExec` nor `TxQuery`.
    #[error("Unknown request name: {0}")]
    UnknownRequest(String),

    /// `request_data` did not decode as the named request.
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// The local chain could not answer.
    #[error("Handler failed: {0}")]
    Handler(String),

    /// Payload serialization failed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Signing failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Transport failure.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// No request frame arrived in time.
    #[error("No request within {0}ms")]
    ReadTimeout(u64),
}

/// Replays queries against the endorser's local view of the chain.
#[async_trait]
pub trait EndorsementHandler: Send + Sync + 'static {
    /// Pre-execute a contract invocation.
    async fn pre_exec(&self, request: &CrossQueryRequest) -> Result<CrossQueryResponse, EndorseError>;

    /// Look up a transaction.
    async fn query_tx(&self, request: &TxStatusRequest) -> Result<TxRecord, EndorseError>;
}

/// Sign `response` to `request` and wrap both in a response envelope.
pub fn build_endorser_response(
    keypair: &Secp256k1KeyPair,
    endorser_address: &str,
    request: &QueryRequest,
    response: &QueryResponse,
) -> Result<EndorserResponse, EndorseError> {
    let digest = endorsement_digest(&Secp256k1Provider, request, response);
    let signature = keypair.sign_digest(&digest)?;

    let payload = EndorsedPayload {
        request: request.clone(),
        response: response.clone(),
    };
    let response_data =
        serde_json::to_vec(&payload).map_err(|e| EndorseError::Encoding(e.to_string()))?;

    Ok(EndorserResponse {
        endorser_address: endorser_address.to_string(),
        response_data,
        endorser_sign: SignatureInfo {
            public_key: keypair.public_key().to_hex(),
            sign: signature.to_vec(),
        },
    })
}

/// Decode an envelope, replay it through `handler`, and sign the result.
pub async fn endorse<H>(
    handler: &H,
    keypair: &Secp256k1KeyPair,
    endorser_address: &str,
    envelope: EndorserRequest,
) -> Result<EndorserResponse, EndorseError>
where
    H: EndorsementHandler + ?Sized,
{
    let kind = QueryKind::from_request_name(&envelope.request_name)
        .ok_or_else(|| EndorseError::UnknownRequest(envelope.request_name.clone()))?;

    let (request, response) = match kind {
        QueryKind::CrossQuery => {
            let request: CrossQueryRequest = serde_json::from_slice(&envelope.request_data)
                .map_err(|e| EndorseError::Malformed(e.to_string()))?;
            let response = handler.pre_exec(&request).await?;
            (
                QueryRequest::CrossQuery(request),
                QueryResponse::CrossQuery(response),
            )
        }
        QueryKind::TxQuery => {
            let request: TxStatusRequest = serde_json::from_slice(&envelope.request_data)
                .map_err(|e| EndorseError::Malformed(e.to_string()))?;
            let response = handler.query_tx(&request).await?;
            (
                QueryRequest::TxStatus(request),
                QueryResponse::Transaction(response),
            )
        }
    };

    build_endorser_response(keypair, endorser_address, &request, &response)
}

/// TCP endorser.
pub struct EndorserServer<H> {
    listener: TcpListener,
    handler: Arc<H>,
    keypair: Arc<Secp256k1KeyPair>,
    address: Arc<str>,
    read_timeout: Duration,
}

impl<H: EndorsementHandler> EndorserServer<H> {
    /// Bind to `addr` (use port 0 for an ephemeral port).
    pub async fn bind(
        addr: &str,
        handler: H,
        keypair: Secp256k1KeyPair,
        endorser_address: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::Connect(format!("bind {}: {}", addr, e)))?;

        Ok(Self {
            listener,
            handler: Arc::new(handler),
            keypair: Arc::new(keypair),
            address: Arc::from(endorser_address.into()),
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Override how long an accepted connection may stay silent.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Bound socket address.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    /// Public key identifier clients must list in their policy.
    pub fn public_key_id(&self) -> String {
        self.keypair.public_key().to_hex()
    }

    /// Accept connections until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Connections still open at shutdown are aborted before this returns.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> Result<(), TransportError> {
        info!(
            addr = ?self.listener.local_addr().ok(),
            public_key = %self.public_key_id(),
            "endorser listening"
        );

        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(in_flight = connections.len(), "endorser shutting down");
                        connections.abort_all();
                        while connections.join_next().await.is_some() {}
                        return Ok(());
                    }
                }
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "endorser connection task failed");
                    }
                }
                accepted = self.listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    debug!(%peer, "endorser connection");

                    let handler = Arc::clone(&self.handler);
                    let keypair = Arc::clone(&self.keypair);
                    let address = Arc::clone(&self.address);
                    let read_timeout = self.read_timeout;
                    connections.spawn(async move {
                        let result =
                            handle_connection(socket, handler, keypair, address, read_timeout).await;
                        if let Err(e) = result {
                            warn!(%peer, error = %e, "endorsement failed");
                        }
                    });
                }
            }
        }
    }
}

async fn handle_connection<H: EndorsementHandler>(
    mut socket: TcpStream,
    handler: Arc<H>,
    keypair: Arc<Secp256k1KeyPair>,
    address: Arc<str>,
    read_timeout: Duration,
) -> Result<(), EndorseError> {
    let timeout_ms = u64::try_from(read_timeout.as_millis()).unwrap_or(u64::MAX);
    let envelope: EndorserRequest = tokio::time::timeout(read_timeout, read_frame(&mut socket))
        .await
        .map_err(|_| EndorseError::ReadTimeout(timeout_ms))??;
    let response = endorse(handler.as_ref(), &keypair, &address, envelope).await?;
    write_frame(&mut socket, &response).await?;
    Ok(())
}
