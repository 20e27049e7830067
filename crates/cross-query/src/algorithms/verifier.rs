//! # Response Verifier
//!
//! Checks an aggregated response before it is handed to the caller:
//!
//! 1. the echoed request equals the submitted one
//! 2. only signatures from policy endorsers are kept (one per key)
//! 3. the kept signatures reach the quorum
//! 4. every kept signature verifies over the endorsement digest
//!
//! Any failure rejects the whole result.
//!
//! Keys are matched by their canonical identifier from the crypto backend,
//! so differently spelled forms of one key are the same endorser.

use crate::domain::{
    invariant_quorum_reached, invariant_request_matches, Aggregation, CanonicalEncode,
    CrossQueryError, EndorsementPolicy, Hash, QueryRequest, QueryResponse, QueryResult,
    SignatureInfo,
};
use crate::ports::outbound::CryptoProvider;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Digest endorsers sign: `hash(canonical(request) ++ canonical(response))`.
pub fn endorsement_digest<P>(crypto: &P, request: &QueryRequest, response: &QueryResponse) -> Hash
where
    P: CryptoProvider + ?Sized,
{
    let mut data = request.to_canonical_bytes();
    data.extend_from_slice(&response.to_canonical_bytes());
    crypto.hash(&data)
}

/// Identity used for matching: the canonical key id, or the trimmed text
/// when the backend cannot decode it.
fn key_identity<P>(crypto: &P, public_key_id: &str) -> String
where
    P: CryptoProvider + ?Sized,
{
    crypto
        .normalize_key_id(public_key_id)
        .unwrap_or_else(|_| public_key_id.trim().to_string())
}

/// Reject policies whose distinct endorser keys cannot reach the quorum.
///
/// Listing one key twice, in any spelling, adds no endorsement power.
pub fn validate_policy_keys<P>(crypto: &P, policy: &EndorsementPolicy) -> Result<(), CrossQueryError>
where
    P: CryptoProvider + ?Sized,
{
    let distinct: HashSet<String> = policy
        .endorsers
        .iter()
        .map(|e| key_identity(crypto, &e.pub_key))
        .collect();

    if distinct.len() < policy.min_endorsements as usize {
        return Err(CrossQueryError::PolicyInvalid {
            endorsers: distinct.len(),
            required: policy.min_endorsements,
            reason: "fewer distinct endorser keys than quorum",
        });
    }
    Ok(())
}

/// Keep signatures whose key belongs to a policy endorser.
///
/// Duplicates of a key are dropped after the first; order is preserved.
pub fn filter_known_signatures<P>(
    crypto: &P,
    policy: &EndorsementPolicy,
    signatures: &[SignatureInfo],
) -> Vec<SignatureInfo>
where
    P: CryptoProvider + ?Sized,
{
    let known: HashSet<String> = policy
        .endorsers
        .iter()
        .map(|e| key_identity(crypto, &e.pub_key))
        .collect();

    let mut seen = HashSet::new();
    signatures
        .iter()
        .filter(|sig| {
            let identity = key_identity(crypto, &sig.public_key);
            if !known.contains(&identity) {
                debug!(public_key = %sig.public_key, "dropping signature from unknown endorser");
                return false;
            }
            seen.insert(identity)
        })
        .cloned()
        .collect()
}

/// Verify an aggregation against the submitted request and the policy.
pub fn verify_endorsements<P>(
    crypto: &P,
    submitted: &QueryRequest,
    aggregation: Aggregation,
    policy: &EndorsementPolicy,
) -> Result<QueryResult, CrossQueryError>
where
    P: CryptoProvider + ?Sized,
{
    invariant_request_matches(submitted, &aggregation.request)?;

    let accepted = filter_known_signatures(crypto, policy, &aggregation.signatures);
    invariant_quorum_reached(accepted.len(), policy.min_endorsements)?;

    let digest = endorsement_digest(crypto, submitted, &aggregation.response);
    for sig in &accepted {
        let key = crypto
            .decode_public_key(&sig.public_key)
            .map_err(|e| CrossQueryError::InvalidSignature {
                public_key: sig.public_key.clone(),
                reason: e.to_string(),
            })?;

        if !crypto.verify(&key, &sig.sign, &digest) {
            warn!(public_key = %sig.public_key, "endorsement signature rejected");
            return Err(CrossQueryError::InvalidSignature {
                public_key: sig.public_key.clone(),
                reason: "signature does not match endorsement digest".to_string(),
            });
        }
    }

    Ok(QueryResult {
        request: submitted.clone(),
        response: aggregation.response,
        signatures: accepted,
    })
}
