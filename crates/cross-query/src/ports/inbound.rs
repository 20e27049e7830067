//! # Inbound Ports
//!
//! API trait defining what a cross-query client can do.

use crate::domain::{
    CrossQueryError, CrossQueryInfo, CrossQueryRequest, EndorsementPolicy, QueryRequest,
    QueryResult, TxQueryInfo, TxStatusRequest,
};
use async_trait::async_trait;

/// Cross-query API - inbound port.
#[async_trait]
pub trait CrossQueryApi: Send + Sync {
    /// Run one endorsed query: validate the policy, collect endorsements,
    /// verify them, and return the agreed result or the first fatal error.
    async fn query(
        &self,
        request: QueryRequest,
        policy: &EndorsementPolicy,
    ) -> Result<QueryResult, CrossQueryError>;

    /// Pre-execute a contract on another chain.
    async fn cross_query(
        &self,
        request: CrossQueryRequest,
        policy: &EndorsementPolicy,
    ) -> Result<CrossQueryInfo, CrossQueryError> {
        self.query(QueryRequest::CrossQuery(request), policy)
            .await?
            .try_into()
    }

    /// Look up a transaction on another chain.
    async fn tx_query(
        &self,
        request: TxStatusRequest,
        policy: &EndorsementPolicy,
    ) -> Result<TxQueryInfo, CrossQueryError> {
        self.query(QueryRequest::TxStatus(request), policy)
            .await?
            .try_into()
    }
}
