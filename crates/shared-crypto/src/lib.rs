//! # Shared Crypto - Endorsement Primitives
//!
//! Cryptographic backend used by Cross-Query clients and endorsers.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Endorsement digests |
//! | `ecdsa` | secp256k1 | Endorser identity and signatures |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization
//! - **Prehashed signing**: endorsers sign the 32-byte digest directly, so
//!   client and endorser must agree on the digest bytes, not on a message format

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many, Hash};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
