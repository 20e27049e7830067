//! # Outbound Ports
//!
//! Traits for external dependencies (endorser transport, crypto backend).

use crate::domain::{EndorserRequest, EndorserResponse, Hash};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_crypto::CryptoError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Transport failures between client and endorser.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Could not open a connection.
    #[error("Connect failed: {0}")]
    Connect(String),

    /// Read or write failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed or oversized frame.
    #[error("Frame error: {0}")]
    Frame(String),

    /// Peer closed the connection before answering.
    #[error("Connection closed by peer")]
    Closed,
}

/// Opens connections to endorsers - outbound port.
///
/// Every call gets a fresh channel; implementations must not hand out
/// pooled connections.
#[async_trait]
pub trait EndorserConnector: Send + Sync {
    /// Open a channel to the endorser at `host`.
    async fn connect(&self, host: &str) -> Result<Box<dyn EndorserChannel>, TransportError>;
}

/// One open connection to an endorser.
///
/// Dropping the channel releases the connection, so cancelling a pending
/// call (e.g. on timeout) never leaks it.
#[async_trait]
pub trait EndorserChannel: Send {
    /// Send one request and wait for the response.
    async fn endorser_call(
        &mut self,
        request: EndorserRequest,
    ) -> Result<EndorserResponse, TransportError>;
}

/// Cryptographic backend - outbound port.
pub trait CryptoProvider: Send + Sync {
    /// Decoded public key.
    type PublicKey;

    /// Digest function for endorsements.
    fn hash(&self, data: &[u8]) -> Hash;

    /// Decode a public key identifier.
    fn decode_public_key(&self, public_key_id: &str) -> Result<Self::PublicKey, CryptoError>;

    /// Canonical identifier of a decoded key. Every accepted spelling of one
    /// key maps to the same identifier.
    fn key_id(&self, key: &Self::PublicKey) -> String;

    /// Canonical identifier for a public key identifier as written.
    fn normalize_key_id(&self, public_key_id: &str) -> Result<String, CryptoError> {
        self.decode_public_key(public_key_id)
            .map(|key| self.key_id(&key))
    }

    /// Check `signature` over `digest` under `key`.
    fn verify(&self, key: &Self::PublicKey, signature: &[u8], digest: &Hash) -> bool;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Scripted behavior of one mock endorser.
#[derive(Clone, Debug)]
pub enum MockEndorserBehavior {
    /// Answer immediately.
    Respond(Box<EndorserResponse>),
    /// Answer after a delay.
    Delayed(Duration, Box<EndorserResponse>),
    /// Refuse the connection.
    Refuse,
    /// Accept the connection and never answer.
    Hang,
    /// Accept the connection and close it without answering.
    Close,
}

/// In-memory endorser network for testing.
///
/// Hosts without a scripted behavior refuse connections. Tracks how many
/// connections were opened and how many are still open.
#[derive(Default)]
pub struct MockEndorserNetwork {
    behaviors: RwLock<HashMap<String, MockEndorserBehavior>>,
    requests: Arc<Mutex<Vec<(String, EndorserRequest)>>>,
    connects: AtomicUsize,
    open_channels: Arc<AtomicUsize>,
}

impl MockEndorserNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the endorser at `host`.
    pub fn set(&self, host: impl Into<String>, behavior: MockEndorserBehavior) {
        self.behaviors.write().insert(host.into(), behavior);
    }

    /// Number of connection attempts so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Channels opened and not yet dropped.
    pub fn open_channels(&self) -> usize {
        self.open_channels.load(Ordering::SeqCst)
    }

    /// Requests received, with the host they were sent to.
    pub fn requests(&self) -> Vec<(String, EndorserRequest)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl EndorserConnector for MockEndorserNetwork {
    async fn connect(&self, host: &str) -> Result<Box<dyn EndorserChannel>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let behavior = self
            .behaviors
            .read()
            .get(host)
            .cloned()
            .unwrap_or(MockEndorserBehavior::Refuse);

        if matches!(behavior, MockEndorserBehavior::Refuse) {
            return Err(TransportError::Connect(format!("{}: connection refused", host)));
        }

        self.open_channels.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockChannel {
            host: host.to_string(),
            behavior,
            requests: Arc::clone(&self.requests),
            open_channels: Arc::clone(&self.open_channels),
        }))
    }
}

struct MockChannel {
    host: String,
    behavior: MockEndorserBehavior,
    requests: Arc<Mutex<Vec<(String, EndorserRequest)>>>,
    open_channels: Arc<AtomicUsize>,
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        self.open_channels.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EndorserChannel for MockChannel {
    async fn endorser_call(
        &mut self,
        request: EndorserRequest,
    ) -> Result<EndorserResponse, TransportError> {
        self.requests.lock().push((self.host.clone(), request));

        match &self.behavior {
            MockEndorserBehavior::Respond(response) => Ok((**response).clone()),
            MockEndorserBehavior::Delayed(delay, response) => {
                tokio::time::sleep(*delay).await;
                Ok((**response).clone())
            }
            MockEndorserBehavior::Hang => std::future::pending().await,
            MockEndorserBehavior::Close => Err(TransportError::Closed),
            MockEndorserBehavior::Refuse => Err(TransportError::Connect(self.host.clone())),
        }
    }
}
