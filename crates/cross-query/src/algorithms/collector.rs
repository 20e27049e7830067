//! # Quorum Collector
//!
//! Fans one call out to every configured endorser, waits for all of them,
//! then folds the outcomes into a single agreed response.
//!
//! ## Join discipline
//!
//! ```text
//! spawn N tasks ──► each sends exactly one outcome on mpsc(N)
//!        │
//!        ▼
//! join_next() until the JoinSet is empty
//!        │
//!        ▼
//! drain exactly N outcomes (or until every sender is gone)
//! ```
//!
//! The drain is bounded by the number of dispatched tasks, never by the
//! channel's current length.

use super::endorser_client::call_endorser;
use crate::domain::{
    invariant_responses_agree, Aggregation, CrossQueryError, EndorsementPolicy, EndorserCallError,
    EndorserCallResult, QueryRequest,
};
use crate::ports::outbound::EndorserConnector;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Outcome of one endorser task.
pub type EndorserOutcome = Result<EndorserCallResult, EndorserCallError>;

/// Query every endorser in `policy` concurrently and aggregate the answers.
pub async fn collect_endorsements<C>(
    connector: Arc<C>,
    request: &QueryRequest,
    policy: &EndorsementPolicy,
    timeout: Duration,
) -> Result<Aggregation, CrossQueryError>
where
    C: EndorserConnector + ?Sized + 'static,
{
    let envelope = request.to_endorser_request()?;
    let kind = request.kind();
    let dispatched = policy.endorsers.len();

    let (tx, mut rx) = mpsc::channel::<EndorserOutcome>(dispatched.max(1));
    let mut tasks = JoinSet::new();

    for endorser in &policy.endorsers {
        let connector = Arc::clone(&connector);
        let host = endorser.host.clone();
        let envelope = envelope.clone();
        let tx = tx.clone();

        tasks.spawn(async move {
            let outcome = call_endorser(connector.as_ref(), &host, envelope, kind, timeout).await;
            // Capacity equals the task count, so this never waits.
            let _ = tx.send(outcome).await;
        });
    }
    drop(tx);

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "endorser task did not complete");
        }
    }

    let mut outcomes = Vec::with_capacity(dispatched);
    for _ in 0..dispatched {
        match rx.recv().await {
            Some(outcome) => outcomes.push(outcome),
            None => break,
        }
    }

    aggregate_outcomes(outcomes)
}

/// Fold endorser outcomes into one agreed response.
///
/// The first successful outcome is the reference; every later success must
/// agree with it. Failures are logged and skipped.
pub fn aggregate_outcomes(outcomes: Vec<EndorserOutcome>) -> Result<Aggregation, CrossQueryError> {
    let mut aggregation: Option<(String, Aggregation)> = None;
    let mut failures = Vec::new();

    for outcome in outcomes {
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(host = e.host(), error = %e, "endorser call failed");
                failures.push(e);
                continue;
            }
        };

        match aggregation.as_mut() {
            None => {
                debug!(host = %result.host, "reference response");
                aggregation = Some((
                    result.host,
                    Aggregation {
                        request: result.request,
                        response: result.response,
                        signatures: vec![result.signature],
                    },
                ));
            }
            Some((reference_host, agreed)) => {
                if !invariant_responses_agree(&agreed.response, &result.response) {
                    return Err(CrossQueryError::ResponseConflict {
                        reference_endorser: reference_host.clone(),
                        reference: Box::new(agreed.response.clone()),
                        conflicting_endorser: result.host,
                        conflicting: Box::new(result.response),
                    });
                }
                debug!(host = %result.host, "response agrees");
                agreed.signatures.push(result.signature);
            }
        }
    }

    aggregation
        .map(|(_, agreed)| agreed)
        .ok_or(CrossQueryError::NoResponses { failures })
}
