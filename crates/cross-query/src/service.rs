//! # Cross-Query Service
//!
//! Application service layer that implements the `CrossQueryApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`CrossQueryApi`)
//! - Uses the outbound ports (`EndorserConnector`, `CryptoProvider`)
//! - Sequences policy validation, collection and verification
//!
//! Each query runs in its own `cross_query` span tagged with a fresh
//! `query_id`. Nothing is shared between queries except the connector.

use crate::adapters::{Secp256k1Provider, TcpConnector};
use crate::algorithms::{collect_endorsements, validate_policy_keys, verify_endorsements};
use crate::domain::{
    invariant_policy_satisfiable, CrossQueryError, EndorsementPolicy, QueryConfig, QueryRequest,
    QueryResult, QueryState,
};
use crate::ports::inbound::CrossQueryApi;
use crate::ports::outbound::{CryptoProvider, EndorserConnector};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Cross-query orchestrator.
pub struct CrossQueryService<C: ?Sized, P> {
    connector: Arc<C>,
    crypto: P,
    config: QueryConfig,
}

impl CrossQueryService<TcpConnector, Secp256k1Provider> {
    /// Service over TCP endorsers with the secp256k1 backend.
    pub fn tcp(config: QueryConfig) -> Self {
        Self::new(Arc::new(TcpConnector::new()), Secp256k1Provider, config)
    }
}

impl<C, P> CrossQueryService<C, P>
where
    C: EndorserConnector + ?Sized + 'static,
    P: CryptoProvider,
{
    /// Create a new service.
    pub fn new(connector: Arc<C>, crypto: P, config: QueryConfig) -> Self {
        Self {
            connector,
            crypto,
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    async fn run(
        &self,
        request: QueryRequest,
        policy: &EndorsementPolicy,
        state: &mut QueryState,
    ) -> Result<QueryResult, CrossQueryError> {
        invariant_policy_satisfiable(policy)?;
        validate_policy_keys(&self.crypto, policy)?;

        advance(state, QueryState::Collecting);
        let aggregation = collect_endorsements(
            Arc::clone(&self.connector),
            &request,
            policy,
            self.config.endorser_timeout,
        )
        .await?;

        advance(state, QueryState::Verifying);
        let result = verify_endorsements(&self.crypto, &request, aggregation, policy)?;

        advance(state, QueryState::Done);
        Ok(result)
    }
}

fn advance(state: &mut QueryState, next: QueryState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid query transition {:?} -> {:?}",
        state,
        next
    );
    debug!(from = ?state, to = ?next, "query state");
    *state = next;
}

#[async_trait]
impl<C, P> CrossQueryApi for CrossQueryService<C, P>
where
    C: EndorserConnector + ?Sized + 'static,
    P: CryptoProvider,
{
    async fn query(
        &self,
        request: QueryRequest,
        policy: &EndorsementPolicy,
    ) -> Result<QueryResult, CrossQueryError> {
        let span = info_span!(
            "cross_query",
            query_id = %Uuid::new_v4(),
            kind = %request.kind(),
            bcname = %request.bcname(),
        );

        async move {
            let mut state = QueryState::default();
            match self.run(request, policy, &mut state).await {
                Ok(result) => {
                    info!(
                        signatures = result.signatures.len(),
                        required = policy.min_endorsements,
                        "query endorsed"
                    );
                    Ok(result)
                }
                Err(e) => {
                    warn!(state = ?state, error = %e, "query rejected");
                    advance(&mut state, QueryState::Failed);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}
