//! # Algorithms Module
//!
//! Endorser calls, quorum collection and endorsement verification.

pub mod collector;
pub mod endorser_client;
pub mod verifier;

pub use collector::{aggregate_outcomes, collect_endorsements, EndorserOutcome};
pub use endorser_client::{call_endorser, decode_endorser_response};
pub use verifier::{endorsement_digest, filter_known_signatures, validate_policy_keys, verify_endorsements};
