//! Signing authorities
//!
//! A [`Signer`] is the opaque `sign(digest) -> signature` capability of one
//! authority. [`LocalSigner`] keeps a secp256k1 key in memory; remote signers
//! (HSMs, wallets, threshold services) implement the same trait.

use std::sync::Arc;

use alloy_primitives::{keccak256, Address, Bytes, B256};
use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use rand::rngs::OsRng;

use crate::error::{KernelError, Result};

/// Byte length of an `r ‖ s ‖ v` ECDSA signature
pub const ECDSA_SIGNATURE_LEN: usize = 65;

/// Capability to produce a signature over a digest
#[async_trait]
pub trait Signer: Send + Sync {
    /// Address-like identity of the authority
    fn address(&self) -> Address;

    /// Sign a 32-byte digest, returning raw signature bytes
    async fn sign(&self, digest: &B256) -> Result<Bytes>;
}

/// In-memory secp256k1 signer
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Generate a fresh key
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Load a 32-byte private key
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key = SigningKey::from_slice(bytes)
            .map_err(|_| KernelError::InvalidConfig("invalid secp256k1 private key".to_string()))?;
        Ok(Self::from_signing_key(key))
    }

    /// Load a hex private key, with or without `0x`
    pub fn from_hex(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(stripped)
            .map_err(|e| KernelError::InvalidConfig(format!("private key is not valid hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Private key as `0x`-prefixed hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.key.to_bytes()))
    }

    /// Sign a prehashed digest, returning `r ‖ s ‖ v` with `v = 27 + recovery id`
    pub fn sign_digest(&self, digest: &B256) -> Result<[u8; ECDSA_SIGNATURE_LEN]> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_slice())
            .map_err(|e| KernelError::signer_unavailable(self.address, e.to_string()))?;

        let mut out = [0u8; ECDSA_SIGNATURE_LEN];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }

    fn from_signing_key(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, digest: &B256) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(&self.sign_digest(digest)?))
    }
}

/// Identity of an authority plus, optionally, its signing capability
///
/// Watch-only handles keep the identity (so init data and addresses are still
/// derivable) but fail every signing request with `SignerUnavailable`.
#[derive(Clone)]
pub struct SignerHandle {
    address: Address,
    signer: Option<Arc<dyn Signer>>,
}

impl SignerHandle {
    pub fn new(signer: Arc<dyn Signer>) -> Self {
        Self {
            address: signer.address(),
            signer: Some(signer),
        }
    }

    pub fn watch_only(address: Address) -> Self {
        Self {
            address,
            signer: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_available(&self) -> bool {
        self.signer.is_some()
    }

    pub async fn sign(&self, digest: &B256) -> Result<Bytes> {
        match &self.signer {
            Some(signer) => signer.sign(digest).await,
            None => Err(KernelError::signer_unavailable(
                self.address,
                "no signing capability attached",
            )),
        }
    }
}

impl std::fmt::Debug for SignerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerHandle")
            .field("address", &self.address)
            .field("available", &self.signer.is_some())
            .finish()
    }
}

impl From<LocalSigner> for SignerHandle {
    fn from(signer: LocalSigner) -> Self {
        SignerHandle::new(Arc::new(signer))
    }
}

/// Placeholder with the byte length of a real ECDSA signature
///
/// Uses a high `r` and a valid-looking `s` so that on-chain recovery runs its
/// full cost path during estimation.
pub fn dummy_ecdsa_signature() -> Bytes {
    let mut sig = [0u8; ECDSA_SIGNATURE_LEN];
    sig[..15].fill(0xff);
    sig[15] = 0xf0;
    sig[32] = 0x7a;
    sig[33..64].fill(0xaa);
    sig[64] = 0x1c;
    Bytes::copy_from_slice(&sig)
}

/// Recover the signing address from an `r ‖ s ‖ v` signature over a digest
pub fn recover_signer(digest: &B256, signature: &[u8]) -> Result<Address> {
    if signature.len() != ECDSA_SIGNATURE_LEN {
        return Err(KernelError::Codec(format!(
            "signature must be {ECDSA_SIGNATURE_LEN} bytes, got {}",
            signature.len()
        )));
    }

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| KernelError::Codec(format!("invalid signature: {e}")))?;
    let v = signature[64];
    let recovery_id = v
        .checked_sub(27)
        .and_then(RecoveryId::from_byte)
        .ok_or_else(|| KernelError::Codec(format!("invalid recovery byte: {v}")))?;

    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .map_err(|e| KernelError::Codec(format!("signature recovery failed: {e}")))?;
    Ok(address_of(&key))
}

/// Ethereum address of a secp256k1 public key
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = PublicKey::from(*key).to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
