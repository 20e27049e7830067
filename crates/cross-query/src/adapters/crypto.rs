//! secp256k1 + SHA-256 crypto backend.

use crate::domain::Hash;
use crate::ports::outbound::CryptoProvider;
use shared_crypto::{sha256, CryptoError, Secp256k1PublicKey, Secp256k1Signature};

/// `CryptoProvider` backed by `shared-crypto`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Provider;

impl CryptoProvider for Secp256k1Provider {
    type PublicKey = Secp256k1PublicKey;

    fn hash(&self, data: &[u8]) -> Hash {
        sha256(data)
    }

    fn decode_public_key(&self, public_key_id: &str) -> Result<Self::PublicKey, CryptoError> {
        Secp256k1PublicKey::from_hex(public_key_id)
    }

    fn key_id(&self, key: &Self::PublicKey) -> String {
        key.to_hex()
    }

    fn verify(&self, key: &Self::PublicKey, signature: &[u8], digest: &Hash) -> bool {
        Secp256k1Signature::from_slice(signature)
            .and_then(|sig| key.verify_digest(digest, &sig))
            .is_ok()
    }
}
