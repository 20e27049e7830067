//! # Domain Errors
//!
//! Error types for endorsed cross-chain queries.
//!
//! Per-endorser failures (`EndorserCallError`) are absorbed by the collector
//! and only surface inside `CrossQueryError::NoResponses`. Everything in
//! `CrossQueryError` is fatal for the query and is never retried.

use super::entities::QueryResponse;
use super::value_objects::QueryKind;
use thiserror::Error;

pub use shared_crypto::Hash;

/// Fatal cross-query errors.
#[derive(Debug, Error)]
pub enum CrossQueryError {
    /// Endorsement policy cannot be satisfied; raised before any network call.
    #[error("Invalid endorsement policy: {endorsers} endorsers, {required} required ({reason})")]
    PolicyInvalid {
        /// Configured endorser count
        endorsers: usize,
        /// Configured minimum endorsements
        required: u32,
        /// Which precondition failed
        reason: &'static str,
    },

    /// Every endorser call failed.
    #[error("No endorser responded ({} failures)", failures.len())]
    NoResponses {
        /// One entry per failed endorser call
        failures: Vec<EndorserCallError>,
    },

    /// Two endorsers returned different responses.
    #[error("Endorser responses differ: {reference_endorser} and {conflicting_endorser}")]
    ResponseConflict {
        /// Endorser whose response became the reference
        reference_endorser: String,
        /// Reference response
        reference: Box<QueryResponse>,
        /// Endorser that disagreed
        conflicting_endorser: String,
        /// Disagreeing response
        conflicting: Box<QueryResponse>,
    },

    /// The request attested by endorsers is not the request that was submitted.
    #[error("Attested request differs from submitted request")]
    RequestMismatch,

    /// Too few known, valid endorsements.
    #[error("Insufficient endorsements: {got}/{required}")]
    InsufficientEndorsements {
        /// Signatures from recognized endorsers
        got: usize,
        /// Minimum required by policy
        required: u32,
    },

    /// A recognized endorser's signature failed verification.
    #[error("Invalid endorsement signature from {public_key}: {reason}")]
    InvalidSignature {
        /// Public key identifier of the signer
        public_key: String,
        /// Failure detail
        reason: String,
    },

    /// A result of one query kind was requested as another.
    #[error("Query kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// Kind the caller asked for
        expected: QueryKind,
        /// Kind actually held
        actual: QueryKind,
    },

    /// Request could not be serialized for the wire.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Failure of a single endorser call. Recoverable: the endorser is excluded
/// from the quorum and sibling calls continue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndorserCallError {
    /// Connection or RPC failed.
    #[error("Endorser {host} unreachable: {reason}")]
    Unreachable {
        /// Endorser address
        host: String,
        /// Transport failure detail
        reason: String,
    },

    /// No response within the per-call timeout.
    #[error("Endorser {host} timed out after {timeout_ms}ms")]
    Timeout {
        /// Endorser address
        host: String,
        /// Configured timeout
        timeout_ms: u64,
    },

    /// Response arrived but its payload could not be decoded.
    #[error("Endorser {host} returned undecodable payload: {reason}")]
    Decode {
        /// Endorser address
        host: String,
        /// Decode failure detail
        reason: String,
    },
}

impl EndorserCallError {
    /// Address of the endorser that failed.
    pub fn host(&self) -> &str {
        match self {
            Self::Unreachable { host, .. } | Self::Timeout { host, .. } | Self::Decode { host, .. } => {
                host
            }
        }
    }
}
