//! # Integration Test Flows
//!
//! Full query path over real sockets:
//!
//! 1. **Policy check**: unsatisfiable policies fail before any connection
//! 2. **Collection**: one TCP call per endorser, bounded by the timeout
//! 3. **Verification**: request echo, identity filter, quorum, signatures
//!
//! Tampering endorsers are raw TCP listeners that sign whatever they are
//! scripted to, so every rejection path is exercised with valid framing.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        closed_port, fixed_answer, sample_cross_request, sample_tx, spawn_scripted_endorser,
        spawn_silent_endorser, EndorserCluster, Script, StaticChain,
    };
    use cross_query::{
        build_endorser_response, CrossQueryApi, CrossQueryError, CrossQueryService,
        EndorsementPolicy, Endorser, EndorserCallError, EndorserRequest,
        EndorserResponse, QueryConfig, QueryRequest, QueryResponse, TxStatusRequest,
    };
    use shared_crypto::Secp256k1KeyPair;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn service() -> CrossQueryService<cross_query::TcpConnector, cross_query::Secp256k1Provider> {
        CrossQueryService::tcp(
            QueryConfig::default().with_endorser_timeout(Duration::from_millis(500)),
        )
    }

    fn contract_request() -> QueryRequest {
        QueryRequest::CrossQuery(sample_cross_request())
    }

    fn contract_answer(body: &[u8]) -> QueryResponse {
        QueryResponse::CrossQuery(cross_query::CrossQueryResponse {
            response: StaticChain::with_body(body).contract,
        })
    }

    fn with_extra(mut policy: EndorsementPolicy, extra: Endorser) -> EndorsementPolicy {
        policy.endorsers.push(extra);
        policy
    }

    // =============================================================================
    // HAPPY PATHS
    // =============================================================================

    #[tokio::test]
    async fn test_contract_query_all_endorsers_agree() {
        let cluster = EndorserCluster::honest(3).await;

        let info = service()
            .cross_query(sample_cross_request(), &cluster.policy(2))
            .await
            .unwrap();

        assert_eq!(info.request, sample_cross_request());
        assert_eq!(info.response.response.status, 200);
        assert_eq!(info.response.response.body, b"42".to_vec());
        assert_eq!(info.signs.len(), 3);
        for sign in &info.signs {
            assert!(cluster.policy(2).is_known_endorser(&sign.public_key));
        }
    }

    #[tokio::test]
    async fn test_tx_query_all_endorsers_agree() {
        let cluster = EndorserCluster::honest(2).await;
        let request = TxStatusRequest {
            bcname: "xuper".to_string(),
            txid: sample_tx().txid,
        };

        let info = service()
            .tx_query(request.clone(), &cluster.policy(2))
            .await
            .unwrap();

        assert_eq!(info.request, request);
        assert_eq!(info.response, sample_tx());
        assert_eq!(info.signs.len(), 2);
    }

    #[tokio::test]
    async fn test_quorum_met_with_silent_endorser() {
        let cluster = EndorserCluster::honest(2).await;
        let policy = with_extra(cluster.policy(2), spawn_silent_endorser().await);

        let started = Instant::now();
        let result = service().query(contract_request(), &policy).await.unwrap();

        assert_eq!(result.signatures.len(), 2);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_quorum_met_with_unreachable_endorser() {
        let cluster = EndorserCluster::honest(2).await;
        let down = Endorser::new(closed_port().await, "02aa", "down");
        let policy = with_extra(cluster.policy(2), down);

        let result = service().query(contract_request(), &policy).await.unwrap();
        assert_eq!(result.signatures.len(), 2);
    }

    // =============================================================================
    // REJECTIONS
    // =============================================================================

    #[tokio::test]
    async fn test_policy_below_quorum_rejected() {
        let cluster = EndorserCluster::honest(1).await;

        let err = service()
            .query(contract_request(), &cluster.policy(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CrossQueryError::PolicyInvalid {
                endorsers: 1,
                required: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_no_endorser_reachable() {
        let policy = EndorsementPolicy::new(
            "xuper",
            vec![
                Endorser::new(closed_port().await, "02aa", "a"),
                Endorser::new(closed_port().await, "02bb", "b"),
            ],
            1,
        );

        let err = service().query(contract_request(), &policy).await.unwrap_err();
        match err {
            CrossQueryError::NoResponses { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures
                    .iter()
                    .all(|f| matches!(f, EndorserCallError::Unreachable { .. })));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_no_response() {
        let cluster = EndorserCluster::honest(2).await;
        let request = TxStatusRequest {
            bcname: "xuper".to_string(),
            txid: vec![0x00; 32],
        };

        let err = service()
            .tx_query(request, &cluster.policy(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CrossQueryError::NoResponses { .. }));
    }

    #[tokio::test]
    async fn test_disagreeing_endorsers_conflict() {
        let cluster = EndorserCluster::start(vec![
            StaticChain::with_body(b"42"),
            StaticChain::with_body(b"43"),
        ])
        .await;

        let err = service()
            .query(contract_request(), &cluster.policy(2))
            .await
            .unwrap_err();
        assert!(matches!(err, CrossQueryError::ResponseConflict { .. }));
    }

    #[tokio::test]
    async fn test_substituted_request_rejected() {
        let keypair = Secp256k1KeyPair::generate();
        let public_key_id = keypair.public_key().to_hex();

        let mut substituted = sample_cross_request();
        substituted.request = cross_query::InvokeRequest::wasm("counter", "get", [("key", "other")]);
        let script = fixed_answer(
            keypair,
            QueryRequest::CrossQuery(substituted),
            contract_answer(b"42"),
        );
        let endorser = spawn_scripted_endorser(public_key_id, script).await;

        let policy = EndorsementPolicy::new("xuper", vec![endorser], 1);
        let err = service().query(contract_request(), &policy).await.unwrap_err();
        assert!(matches!(err, CrossQueryError::RequestMismatch));
    }

    #[tokio::test]
    async fn test_unrecognized_signer_not_counted() {
        let cluster = EndorserCluster::honest(1).await;

        // Signs a correct answer, but with a key the policy does not list.
        let impostor = Secp256k1KeyPair::generate();
        let listed_key = Secp256k1KeyPair::generate().public_key().to_hex();
        let script = fixed_answer(impostor, contract_request(), contract_answer(b"42"));
        let endorser = spawn_scripted_endorser(listed_key, script).await;

        let policy = with_extra(cluster.policy(2), endorser);
        let err = service().query(contract_request(), &policy).await.unwrap_err();
        assert!(matches!(
            err,
            CrossQueryError::InsufficientEndorsements { got: 1, required: 2 }
        ));
    }

    #[tokio::test]
    async fn test_forged_signature_rejected() {
        let cluster = EndorserCluster::honest(1).await;

        let forger = Secp256k1KeyPair::generate();
        let public_key_id = forger.public_key().to_hex();
        let script: Arc<Script> = Arc::new(move |_: EndorserRequest| -> Option<EndorserResponse> {
            let mut response =
                build_endorser_response(&forger, "forger", &contract_request(), &contract_answer(b"42"))
                    .ok()?;
            response.endorser_sign.sign[5] ^= 0x01;
            Some(response)
        });
        let endorser = spawn_scripted_endorser(public_key_id.clone(), script).await;

        let policy = with_extra(cluster.policy(2), endorser);
        let err = service().query(contract_request(), &policy).await.unwrap_err();
        match err {
            CrossQueryError::InvalidSignature { public_key, .. } => {
                assert_eq!(public_key, public_key_id)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_payload_counts_as_failure() {
        let cluster = EndorserCluster::honest(1).await;

        let keypair = Secp256k1KeyPair::generate();
        let public_key_id = keypair.public_key().to_hex();
        let script: Arc<Script> = Arc::new(move |_: EndorserRequest| -> Option<EndorserResponse> {
            let mut response =
                build_endorser_response(&keypair, "garbage", &contract_request(), &contract_answer(b"42"))
                    .ok()?;
            response.response_data = b"not an endorsed payload".to_vec();
            Some(response)
        });
        let endorser = spawn_scripted_endorser(public_key_id, script).await;

        // The garbled endorser is excluded; one honest endorser cannot meet a quorum of two.
        let policy = with_extra(cluster.policy(2), endorser);
        let err = service().query(contract_request(), &policy).await.unwrap_err();
        assert!(matches!(
            err,
            CrossQueryError::InsufficientEndorsements { got: 1, required: 2 }
        ));
    }

    #[tokio::test]
    async fn test_endorsed_payload_echoes_request() {
        let cluster = EndorserCluster::honest(1).await;
        let mut channel = {
            use cross_query::EndorserConnector;
            cross_query::TcpConnector::new()
                .connect(&cluster.endorsers[0].host)
                .await
                .unwrap()
        };

        let response = channel
            .endorser_call(contract_request().to_endorser_request().unwrap())
            .await
            .unwrap();
        let result = cross_query::algorithms::decode_endorser_response(
            "probe",
            response,
            cross_query::QueryKind::CrossQuery,
        )
        .unwrap();
        assert_eq!(result.request, contract_request());
        assert_eq!(result.response, contract_answer(b"42"));
        assert_eq!(result.signature.public_key, cluster.endorsers[0].pub_key);
    }
}
