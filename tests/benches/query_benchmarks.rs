//! # Cross-Query Benchmarks
//!
//! | Path | Work per call |
//! |------|---------------|
//! | Canonical encoding | one request + one response |
//! | Verification | digest + one ECDSA verify per endorser |
//! | Aggregation | one comparison per endorser |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cross_query::algorithms::decode_endorser_response;
use cross_query::{
    aggregate_outcomes, build_endorser_response, verify_endorsements, Aggregation,
    CanonicalEncode, ContractResponse, CrossQueryRequest, CrossQueryResponse, EndorsementPolicy,
    Endorser, InvokeRequest, QueryKind, QueryRequest, QueryResponse, Secp256k1Provider,
};
use shared_crypto::Secp256k1KeyPair;
use std::time::Duration;

fn request() -> QueryRequest {
    QueryRequest::CrossQuery(CrossQueryRequest {
        bcname: "xuper".to_string(),
        timestamp: 1_700_000_000_000_000_000,
        initiator: "dpzuVdosQrF2kmzumhVeFQZa1aYcdgFpN".to_string(),
        auth_require: vec!["dpzuVdosQrF2kmzumhVeFQZa1aYcdgFpN".to_string()],
        request: InvokeRequest::wasm(
            "counter",
            "get",
            (0..16).map(|i| (format!("key{:02}", i), "value")),
        ),
    })
}

fn response() -> QueryResponse {
    QueryResponse::CrossQuery(CrossQueryResponse {
        response: ContractResponse {
            status: 200,
            message: "ok".to_string(),
            body: vec![0xab; 1024],
        },
    })
}

/// Policy plus the decoded outcomes of `n` honest endorsers.
fn endorsed(n: usize) -> (EndorsementPolicy, Vec<cross_query::EndorserCallResult>) {
    let mut endorsers = Vec::with_capacity(n);
    let mut results = Vec::with_capacity(n);

    for i in 0..n {
        let keypair = Secp256k1KeyPair::generate();
        let host = format!("10.0.0.{}:37101", i);
        endorsers.push(Endorser::new(host.clone(), keypair.public_key().to_hex(), "addr"));

        let envelope = build_endorser_response(&keypair, "addr", &request(), &response()).unwrap();
        results.push(decode_endorser_response(&host, envelope, QueryKind::CrossQuery).unwrap());
    }

    (EndorsementPolicy::new("xuper", endorsers, n as u32), results)
}

fn bench_canonical_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonical-encoding");
    let (req, resp) = (request(), response());

    group.bench_function("request_and_response", |b| {
        b.iter(|| {
            let mut bytes = black_box(&req).to_canonical_bytes();
            bytes.extend_from_slice(&black_box(&resp).to_canonical_bytes());
            black_box(bytes)
        })
    });

    group.finish();
}

fn bench_verify_endorsements(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify-endorsements");
    group.measurement_time(Duration::from_secs(10));

    for n in [1usize, 4, 16] {
        let (policy, results) = endorsed(n);
        let aggregation = Aggregation {
            request: request(),
            response: response(),
            signatures: results.iter().map(|r| r.signature.clone()).collect(),
        };

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("endorsers", n), &aggregation, |b, agg| {
            b.iter(|| verify_endorsements(&Secp256k1Provider, &request(), agg.clone(), &policy).unwrap())
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate-outcomes");

    for n in [4usize, 16, 64] {
        let (_, results) = endorsed(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("endorsers", n), &results, |b, results| {
            b.iter(|| aggregate_outcomes(results.iter().cloned().map(Ok).collect()).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_canonical_encoding,
    bench_verify_endorsements,
    bench_aggregate
);
criterion_main!(benches);
