//! # Domain Module
//!
//! Core domain types for endorsed cross-chain queries.

pub mod canonical;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use canonical::{CanonicalDecode, CanonicalDecoder, CanonicalEncode, CanonicalEncoder, CodecError};
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::*;
