//! # Domain Invariants
//!
//! Business rules checked before a query result is trusted.

use super::canonical::CanonicalEncode;
use super::entities::{EndorsementPolicy, QueryRequest, QueryResponse};
use super::errors::CrossQueryError;

/// Invariant: the policy can be satisfied at all.
///
/// Checked before any network call. An empty endorser set or a zero quorum
/// is rejected rather than treated as trivially satisfied.
pub fn invariant_policy_satisfiable(policy: &EndorsementPolicy) -> Result<(), CrossQueryError> {
    let reason = if policy.endorsers.is_empty() {
        Some("no endorsers configured")
    } else if policy.min_endorsements == 0 {
        Some("quorum must be at least one")
    } else if policy.endorsers.len() < policy.min_endorsements as usize {
        Some("fewer endorsers than quorum")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CrossQueryError::PolicyInvalid {
            endorsers: policy.endorsers.len(),
            required: policy.min_endorsements,
            reason,
        }),
        None => Ok(()),
    }
}

/// Invariant: endorsers attested the request the caller submitted.
pub fn invariant_request_matches(
    submitted: &QueryRequest,
    attested: &QueryRequest,
) -> Result<(), CrossQueryError> {
    if submitted.to_canonical_bytes() != attested.to_canonical_bytes() {
        return Err(CrossQueryError::RequestMismatch);
    }
    Ok(())
}

/// Invariant: enough recognized endorsements.
pub fn invariant_quorum_reached(accepted: usize, required: u32) -> Result<(), CrossQueryError> {
    if accepted < required as usize {
        return Err(CrossQueryError::InsufficientEndorsements {
            got: accepted,
            required,
        });
    }
    Ok(())
}

/// Invariant: two endorser responses agree.
///
/// Contract responses are compared field by field (status, message, body);
/// transactions by their canonical bytes. Different kinds never agree.
pub fn invariant_responses_agree(reference: &QueryResponse, candidate: &QueryResponse) -> bool {
    match (reference, candidate) {
        (QueryResponse::CrossQuery(a), QueryResponse::CrossQuery(b)) => {
            a.response.status == b.response.status
                && a.response.message == b.response.message
                && a.response.body == b.response.body
        }
        (QueryResponse::Transaction(a), QueryResponse::Transaction(b)) => {
            a.to_canonical_bytes() == b.to_canonical_bytes()
        }
        _ => false,
    }
}
