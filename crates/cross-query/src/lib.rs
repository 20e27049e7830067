//! # Cross-Query
//!
//! Endorsed reads from another chain.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A caller submits a contract pre-execution or a transaction lookup against
//! a remote chain. Every configured endorser replays the query and signs what
//! it saw. The result is accepted only if:
//! - all responding endorsers return the same response
//! - each echoes exactly the submitted request
//! - at least `min_endorsements` recognized endorsers signed it
//! - every recognized signature verifies
//!
//! ## Query Flow
//!
//! ```text
//! query(request, policy)
//!   │
//!   ├─ Validating   policy has enough distinct endorser keys for a non-zero quorum
//!   ├─ Collecting   one task per endorser, bounded by endorser_timeout
//!   ├─ Verifying    request echo, identity filter, quorum, signatures
//!   └─ Done         QueryResult { request, response, signatures }
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! cross-query/
//! ├── domain/          # Requests, responses, policy, canonical encoding, errors
//! ├── algorithms/      # Endorser client, quorum collector, verifier
//! ├── ports/           # CrossQueryApi, EndorserConnector, CryptoProvider
//! ├── adapters/        # TCP transport, secp256k1 backend, endorser server
//! └── service.rs       # CrossQueryService orchestrator
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    build_endorser_response, EndorseError, EndorsementHandler, EndorserServer, Secp256k1Provider,
    TcpConnector,
};
pub use algorithms::{
    aggregate_outcomes, call_endorser, collect_endorsements, endorsement_digest,
    filter_known_signatures, validate_policy_keys, verify_endorsements,
};
pub use domain::{
    Aggregation, CanonicalDecode, CanonicalEncode, CodecError, ContractResponse, CrossQueryError,
    CrossQueryInfo, CrossQueryRequest, CrossQueryResponse, EndorsedPayload, EndorsementPolicy,
    Endorser, EndorserCallError, EndorserCallResult, EndorserRequest, EndorserResponse, Hash,
    InvokeRequest, QueryConfig, QueryKind, QueryRequest, QueryResponse, QueryResult, QueryState,
    SignatureInfo, TxQueryInfo, TxRecord, TxStatusRequest, DEFAULT_ENDORSER_TIMEOUT,
};
pub use ports::{
    CrossQueryApi, CryptoProvider, EndorserChannel, EndorserConnector, MockEndorserBehavior,
    MockEndorserNetwork, TransportError,
};
pub use service::CrossQueryService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
