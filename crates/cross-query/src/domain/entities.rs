//! # Domain Entities
//!
//! Queries, responses, endorsement policies and the wire envelopes exchanged
//! with endorsers.

use super::errors::CrossQueryError;
use super::value_objects::QueryKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default per-endorser call timeout.
pub const DEFAULT_ENDORSER_TIMEOUT: Duration = Duration::from_secs(6);

/// Module name used for contract invocations built by [`InvokeRequest::wasm`].
pub const WASM_MODULE: &str = "wasm";

/// A trusted remote party that replays and signs queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorser {
    /// Network address (`host:port`).
    pub host: String,
    /// Public key identifier (hex SEC1).
    pub pub_key: String,
    /// Human-readable account address.
    pub address: String,
}

impl Endorser {
    /// Create an endorser entry.
    pub fn new(
        host: impl Into<String>,
        pub_key: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            pub_key: pub_key.into(),
            address: address.into(),
        }
    }
}

/// Trusted endorser set and minimum quorum for one query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementPolicy {
    /// Remote chain family (e.g. `"xuper"`); informational.
    pub chain_type: String,
    /// Endorsers to query, in order.
    pub endorsers: Vec<Endorser>,
    /// Minimum number of agreeing, validly signed endorsements.
    pub min_endorsements: u32,
}

impl EndorsementPolicy {
    /// Create a policy.
    pub fn new(chain_type: impl Into<String>, endorsers: Vec<Endorser>, min_endorsements: u32) -> Self {
        Self {
            chain_type: chain_type.into(),
            endorsers,
            min_endorsements,
        }
    }

    /// True if the policy can be satisfied at all.
    pub fn is_valid(&self) -> bool {
        super::invariants::invariant_policy_satisfiable(self).is_ok()
    }

    /// Check whether a public key identifier is listed verbatim.
    ///
    /// Quorum counting does not use this; the verifier matches keys by their
    /// canonical identifier, so spelling differences are tolerated there.
    pub fn is_known_endorser(&self, pub_key: &str) -> bool {
        self.endorsers.iter().any(|e| e.pub_key == pub_key)
    }
}

/// Contract invocation replayed by endorsers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeRequest {
    /// Contract VM module (e.g. `"wasm"`).
    pub module_name: String,
    /// Contract name.
    pub contract_name: String,
    /// Method name.
    pub method_name: String,
    /// Arguments, ordered by key.
    pub args: BTreeMap<String, Vec<u8>>,
}

impl InvokeRequest {
    /// Build a wasm contract invocation from string arguments.
    pub fn wasm<K, V>(
        contract_name: impl Into<String>,
        method_name: impl Into<String>,
        args: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        Self {
            module_name: WASM_MODULE.to_string(),
            contract_name: contract_name.into(),
            method_name: method_name.into(),
            args: args
                .into_iter()
                .map(|(k, v)| (k.into(), v.as_ref().as_bytes().to_vec()))
                .collect(),
        }
    }
}

/// Contract pre-execution query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossQueryRequest {
    /// Remote chain name.
    pub bcname: String,
    /// Caller timestamp (Unix nanoseconds).
    pub timestamp: i64,
    /// Initiating account.
    pub initiator: String,
    /// Accounts whose authorization the query requires.
    pub auth_require: Vec<String>,
    /// Invocation to pre-execute.
    pub request: InvokeRequest,
}

/// Transaction status query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatusRequest {
    /// Remote chain name.
    pub bcname: String,
    /// Transaction id.
    pub txid: Vec<u8>,
}

/// A query submitted for endorsement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryRequest {
    /// Contract pre-execution.
    CrossQuery(CrossQueryRequest),
    /// Transaction lookup.
    TxStatus(TxStatusRequest),
}

impl QueryRequest {
    /// Query kind.
    pub fn kind(&self) -> QueryKind {
        match self {
            QueryRequest::CrossQuery(_) => QueryKind::CrossQuery,
            QueryRequest::TxStatus(_) => QueryKind::TxQuery,
        }
    }

    /// Remote chain name.
    pub fn bcname(&self) -> &str {
        match self {
            QueryRequest::CrossQuery(req) => &req.bcname,
            QueryRequest::TxStatus(req) => &req.bcname,
        }
    }

    /// Wrap the request in the envelope sent to every endorser.
    pub fn to_endorser_request(&self) -> Result<EndorserRequest, CrossQueryError> {
        let request_data = match self {
            QueryRequest::CrossQuery(req) => serde_json::to_vec(req),
            QueryRequest::TxStatus(req) => serde_json::to_vec(req),
        }
        .map_err(|e| CrossQueryError::Encoding(e.to_string()))?;

        Ok(EndorserRequest {
            request_name: self.kind().request_name().to_string(),
            bcname: self.bcname().to_string(),
            request_data,
        })
    }
}

/// Contract execution outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractResponse {
    /// Status code (0 = success).
    pub status: i32,
    /// Status message.
    pub message: String,
    /// Opaque return body.
    pub body: Vec<u8>,
}

/// Result of a contract pre-execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossQueryResponse {
    /// Contract response.
    pub response: ContractResponse,
}

/// Transaction as reported by an endorser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Transaction id.
    pub txid: Vec<u8>,
    /// Containing block id (empty if unconfirmed).
    pub blockid: Vec<u8>,
    /// Initiating account.
    pub initiator: String,
    /// Transaction timestamp (Unix nanoseconds).
    pub timestamp: i64,
    /// Description field.
    pub desc: Vec<u8>,
    /// Remaining serialized transaction body.
    pub body: Vec<u8>,
}

/// A response attested by endorsers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryResponse {
    /// Contract pre-execution result.
    CrossQuery(CrossQueryResponse),
    /// Transaction lookup result.
    Transaction(TxRecord),
}

impl QueryResponse {
    /// Query kind this response answers.
    pub fn kind(&self) -> QueryKind {
        match self {
            QueryResponse::CrossQuery(_) => QueryKind::CrossQuery,
            QueryResponse::Transaction(_) => QueryKind::TxQuery,
        }
    }
}

/// Endorser signature over an endorsement digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    /// Public key identifier of the signer.
    pub public_key: String,
    /// Signature bytes (64-byte r||s).
    pub sign: Vec<u8>,
}

/// Request envelope sent to an endorser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorserRequest {
    /// `"CrossQueryPreExec"` or `"TxQuery"`.
    pub request_name: String,
    /// Remote chain name.
    pub bcname: String,
    /// JSON of the inner request.
    pub request_data: Vec<u8>,
}

/// Response envelope returned by an endorser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorserResponse {
    /// Account address of the endorser.
    pub endorser_address: String,
    /// JSON of an [`EndorsedPayload`].
    pub response_data: Vec<u8>,
    /// Signature over the endorsement digest.
    pub endorser_sign: SignatureInfo,
}

/// What an endorser attests to: the request it replayed and what it saw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsedPayload {
    /// Echo of the replayed request.
    pub request: QueryRequest,
    /// Observed response.
    pub response: QueryResponse,
}

/// Decoded outcome of one successful endorser call.
#[derive(Clone, Debug)]
pub struct EndorserCallResult {
    /// Endorser address.
    pub host: String,
    /// Request echoed by the endorser.
    pub request: QueryRequest,
    /// Response returned.
    pub response: QueryResponse,
    /// Endorser signature.
    pub signature: SignatureInfo,
}

/// Agreed response and the signatures of every endorser that returned it.
#[derive(Clone, Debug)]
pub struct Aggregation {
    /// Request echoed by the reference endorser.
    pub request: QueryRequest,
    /// Agreed response.
    pub response: QueryResponse,
    /// Signatures of all agreeing endorsers, in arrival order.
    pub signatures: Vec<SignatureInfo>,
}

/// Verified query result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Submitted request.
    pub request: QueryRequest,
    /// Agreed response.
    pub response: QueryResponse,
    /// Verified signatures from recognized endorsers.
    pub signatures: Vec<SignatureInfo>,
}

/// Verified contract pre-execution result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossQueryInfo {
    /// Submitted request.
    pub request: CrossQueryRequest,
    /// Agreed response.
    pub response: CrossQueryResponse,
    /// Verified signatures.
    pub signs: Vec<SignatureInfo>,
}

/// Verified transaction lookup result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxQueryInfo {
    /// Submitted request.
    pub request: TxStatusRequest,
    /// Agreed transaction.
    pub response: TxRecord,
    /// Verified signatures.
    pub signs: Vec<SignatureInfo>,
}

impl TryFrom<QueryResult> for CrossQueryInfo {
    type Error = CrossQueryError;

    fn try_from(result: QueryResult) -> Result<Self, Self::Error> {
        match (result.request, result.response) {
            (QueryRequest::CrossQuery(request), QueryResponse::CrossQuery(response)) => Ok(Self {
                request,
                response,
                signs: result.signatures,
            }),
            (request, _) => Err(CrossQueryError::KindMismatch {
                expected: QueryKind::CrossQuery,
                actual: request.kind(),
            }),
        }
    }
}

impl TryFrom<QueryResult> for TxQueryInfo {
    type Error = CrossQueryError;

    fn try_from(result: QueryResult) -> Result<Self, Self::Error> {
        match (result.request, result.response) {
            (QueryRequest::TxStatus(request), QueryResponse::Transaction(response)) => Ok(Self {
                request,
                response,
                signs: result.signatures,
            }),
            (request, _) => Err(CrossQueryError::KindMismatch {
                expected: QueryKind::TxQuery,
                actual: request.kind(),
            }),
        }
    }
}

/// Cross-query client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryConfig {
    /// Bound on each endorser call (connect + request + response).
    pub endorser_timeout: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            endorser_timeout: DEFAULT_ENDORSER_TIMEOUT,
        }
    }
}

impl QueryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CQ_ENDORSER_TIMEOUT_MS`: per-endorser timeout (default: 6000)
    pub fn from_env() -> Self {
        let endorser_timeout = std::env::var("CQ_ENDORSER_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_ENDORSER_TIMEOUT);

        Self { endorser_timeout }
    }

    /// Override the per-endorser timeout.
    pub fn with_endorser_timeout(mut self, timeout: Duration) -> Self {
        self.endorser_timeout = timeout;
        self
    }
}
