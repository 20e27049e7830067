//! # Test Fixtures
//!
//! In-process endorsers for end-to-end flows.
//!
//! - [`EndorserCluster`]: honest `EndorserServer`s over a fixed chain view
//! - [`spawn_scripted_endorser`]: raw TCP endorser whose answer is computed
//!   by a closure, for tampering and silence

use async_trait::async_trait;
use cross_query::adapters::{read_frame, write_frame};
use cross_query::{
    build_endorser_response, ContractResponse, CrossQueryRequest, CrossQueryResponse,
    EndorseError, EndorsementHandler, EndorsementPolicy, Endorser, EndorserRequest,
    EndorserResponse, EndorserServer, InvokeRequest, TxRecord, TxStatusRequest,
};
use shared_crypto::Secp256k1KeyPair;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

// =============================================================================
// CHAIN FIXTURES
// =============================================================================

/// Fixed chain view served by an honest endorser.
#[derive(Clone, Debug)]
pub struct StaticChain {
    /// Answer to every contract pre-execution.
    pub contract: ContractResponse,
    /// The one transaction this chain knows.
    pub tx: TxRecord,
}

impl StaticChain {
    /// Chain whose contracts return `body`.
    pub fn with_body(body: &[u8]) -> Self {
        Self {
            contract: ContractResponse {
                status: 200,
                message: "ok".to_string(),
                body: body.to_vec(),
            },
            tx: sample_tx(),
        }
    }
}

#[async_trait]
impl EndorsementHandler for StaticChain {
    async fn pre_exec(&self, _request: &CrossQueryRequest) -> Result<CrossQueryResponse, EndorseError> {
        Ok(CrossQueryResponse {
            response: self.contract.clone(),
        })
    }

    async fn query_tx(&self, request: &TxStatusRequest) -> Result<TxRecord, EndorseError> {
        if request.txid == self.tx.txid {
            Ok(self.tx.clone())
        } else {
            Err(EndorseError::Handler("tx not found".to_string()))
        }
    }
}

/// Transaction every [`StaticChain`] knows by default.
pub fn sample_tx() -> TxRecord {
    TxRecord {
        txid: vec![0xcf; 32],
        blockid: vec![0x1b; 32],
        initiator: "dpzuVdosQrF2kmzumhVeFQZa1aYcdgFpN".to_string(),
        timestamp: 1_700_000_000_000_000_000,
        desc: b"deposit".to_vec(),
        body: b"tx-body".to_vec(),
    }
}

/// Contract query used across flows.
pub fn sample_cross_request() -> CrossQueryRequest {
    CrossQueryRequest {
        bcname: "xuper".to_string(),
        timestamp: 1_700_000_000_000_000_000,
        initiator: "dpzuVdosQrF2kmzumhVeFQZa1aYcdgFpN".to_string(),
        auth_require: vec!["dpzuVdosQrF2kmzumhVeFQZa1aYcdgFpN".to_string()],
        request: InvokeRequest::wasm("counter", "get", [("key", "dudu")]),
    }
}

// =============================================================================
// HONEST ENDORSERS
// =============================================================================

/// A set of running `EndorserServer`s sharing one shutdown signal.
pub struct EndorserCluster {
    /// One entry per running server, in start order.
    pub endorsers: Vec<Endorser>,
    shutdown: watch::Sender<bool>,
}

impl EndorserCluster {
    /// Start one server per chain view on an ephemeral port.
    pub async fn start(chains: Vec<StaticChain>) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut endorsers = Vec::with_capacity(chains.len());

        for (i, chain) in chains.into_iter().enumerate() {
            let address = format!("endorser-{}", i);
            let server = EndorserServer::bind(
                "127.0.0.1:0",
                chain,
                Secp256k1KeyPair::generate(),
                address.clone(),
            )
            .await
            .expect("bind endorser");

            endorsers.push(Endorser::new(
                server.local_addr().expect("local addr").to_string(),
                server.public_key_id(),
                address,
            ));
            tokio::spawn(server.serve(shutdown_rx.clone()));
        }

        Self {
            endorsers,
            shutdown,
        }
    }

    /// Start `n` endorsers that all see the same chain.
    pub async fn honest(n: usize) -> Self {
        Self::start(vec![StaticChain::with_body(b"42"); n]).await
    }

    /// Policy over every endorser in the cluster.
    pub fn policy(&self, min_endorsements: u32) -> EndorsementPolicy {
        EndorsementPolicy::new("xuper", self.endorsers.clone(), min_endorsements)
    }

    /// Stop every server.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for EndorserCluster {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// SCRIPTED ENDORSERS
// =============================================================================

/// Answer computed by a scripted endorser; `None` keeps the connection open
/// without answering.
pub type Script = dyn Fn(EndorserRequest) -> Option<EndorserResponse> + Send + Sync;

/// Start a raw endorser whose answers come from `script`, listed under
/// `public_key_id`.
pub async fn spawn_scripted_endorser(public_key_id: String, script: Arc<Script>) -> Endorser {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let host = listener.local_addr().expect("local addr").to_string();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let script = Arc::clone(&script);
            tokio::spawn(async move {
                let Ok(request) = read_frame::<_, EndorserRequest>(&mut socket).await else {
                    return;
                };
                match (*script)(request) {
                    Some(response) => {
                        let _ = write_frame(&mut socket, &response).await;
                    }
                    None => std::future::pending::<()>().await,
                }
            });
        }
    });

    Endorser::new(host, public_key_id, "scripted")
}

/// Endorser that accepts the request and never answers.
pub async fn spawn_silent_endorser() -> Endorser {
    let public_key_id = Secp256k1KeyPair::generate().public_key().to_hex();
    let script: Arc<Script> = Arc::new(|_: EndorserRequest| -> Option<EndorserResponse> { None });
    spawn_scripted_endorser(public_key_id, script).await
}

/// Sign a fixed (request, response) pair regardless of what was asked.
pub fn fixed_answer(
    keypair: Secp256k1KeyPair,
    request: cross_query::QueryRequest,
    response: cross_query::QueryResponse,
) -> Arc<Script> {
    Arc::new(move |_: EndorserRequest| -> Option<EndorserResponse> {
        build_endorser_response(&keypair, "scripted", &request, &response).ok()
    })
}

/// Address of a port nothing listens on.
pub async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr").to_string();
    drop(listener);
    addr
}
