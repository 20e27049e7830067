//! # Integration Tests
//!
//! End-to-end flows: `CrossQueryService` over `TcpConnector` against real
//! `EndorserServer`s bound to `127.0.0.1:0`.

pub mod flows;
