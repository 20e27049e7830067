//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for endorsed queries, plus the endorser
//! side of the wire protocol.

mod crypto;
mod endorser_server;
pub mod framing;
mod tcp_client;

pub use crypto::Secp256k1Provider;
pub use endorser_server::{
    build_endorser_response, endorse, EndorseError, EndorsementHandler, EndorserServer,
    DEFAULT_READ_TIMEOUT,
};
pub use framing::{read_frame, write_frame, MAX_FRAME_SIZE};
pub use tcp_client::{TcpChannel, TcpConnector};
