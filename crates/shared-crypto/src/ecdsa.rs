//! # ECDSA Signatures (secp256k1)
//!
//! Endorser signatures over prehashed 32-byte digests.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization on signing; high-S signatures fail verification
//! - Public keys travel as lowercase hex of the compressed SEC1 encoding

use crate::hashing::Hash;
use crate::CryptoError;
use k256::ecdsa::{
    signature::hazmat::{PrehashSigner, PrehashVerifier},
    Signature, SigningKey, VerifyingKey,
};
use zeroize::{Zeroize, Zeroizing};

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey([u8; 33]);

impl Secp256k1PublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(&bytes)
            .map_err(|_| CryptoError::InvalidPublicKey("not a curve point".to_string()))?;
        Ok(Self(bytes))
    }

    /// Decode a public key identifier.
    ///
    /// Accepts compressed (33 bytes) or uncompressed (65 bytes) SEC1 hex and
    /// normalizes to the compressed form.
    pub fn from_hex(id: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(id.trim())
            .map_err(|e| CryptoError::InvalidPublicKey(format!("bad hex: {}", e)))?;
        let verifying_key = VerifyingKey::from_sec1_bytes(&raw)
            .map_err(|_| CryptoError::InvalidPublicKey("not a curve point".to_string()))?;
        Self::from_verifying_key(&verifying_key)
    }

    fn from_verifying_key(verifying_key: &VerifyingKey) -> Result<Self, CryptoError> {
        let sec1 = verifying_key.to_sec1_bytes();
        let bytes: [u8; 33] = sec1[..].try_into().map_err(|_| {
            CryptoError::InvalidPublicKey(format!("unexpected SEC1 length {}", sec1.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Public key identifier as carried in endorser policies and signatures.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify a signature over a prehashed digest.
    pub fn verify_digest(
        &self,
        digest: &Hash,
        signature: &Secp256k1Signature,
    ) -> Result<(), CryptoError> {
        let verifying_key = VerifyingKey::from_sec1_bytes(&self.0)
            .map_err(|_| CryptoError::InvalidPublicKey("not a curve point".to_string()))?;

        let sig = Signature::from_slice(&signature.0)
            .map_err(|_| CryptoError::InvalidSignatureFormat(signature.0.len()))?;

        verifying_key
            .verify_prehash(digest, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// ECDSA signature (64 bytes, r||s format).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1Signature([u8; 64]);

impl Secp256k1Signature {
    /// Create from bytes (64 bytes).
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice received off the wire.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let fixed: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureFormat(bytes.len()))?;
        Ok(Self(fixed))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Copy into an owned buffer for wire envelopes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// secp256k1 ECDSA keypair held by an endorser.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes). The caller's copy is wiped.
    pub fn from_bytes(mut bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_bytes((&bytes).into());
        bytes.zeroize();
        let signing_key = signing_key.map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Get public key (compressed, 33 bytes).
    pub fn public_key(&self) -> Secp256k1PublicKey {
        let sec1_bytes = self.signing_key.verifying_key().to_sec1_bytes();
        // SEC1 compressed keys are always 33 bytes
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(&sec1_bytes[..33]);
        Secp256k1PublicKey(bytes)
    }

    /// Sign a 32-byte digest (deterministic RFC 6979).
    pub fn sign_digest(&self, digest: &Hash) -> Result<Secp256k1Signature, CryptoError> {
        let sig = PrehashSigner::<Signature>::sign_prehash(&self.signing_key, digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let bytes: [u8; 64] = sig.to_bytes().into();
        Ok(Secp256k1Signature(bytes))
    }

    /// Secret key bytes, wiped when the returned buffer drops.
    ///
    /// `SigningKey` zeroizes itself on drop, so this buffer is the only extra copy.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes().into())
    }
}
