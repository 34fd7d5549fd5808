//! Single-signer ECDSA validator

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use tracing::debug;

use super::ValidatorPlugin;
use crate::crypto::signer::{dummy_ecdsa_signature, SignerHandle};
use crate::error::Result;
use crate::types::KernelVersion;

/// Validator owned by exactly one signer
#[derive(Debug, Clone)]
pub struct EcdsaValidator {
    signer: SignerHandle,
    validator_address: Address,
}

impl EcdsaValidator {
    /// Validator for the ECDSA module deployed with `version`
    pub fn new(signer: impl Into<SignerHandle>, version: KernelVersion) -> Self {
        Self::from_handle(signer.into(), version.ecdsa_validator())
    }

    /// Validator that knows its owner but cannot sign
    pub fn watch_only(owner: Address, version: KernelVersion) -> Self {
        Self::from_handle(SignerHandle::watch_only(owner), version.ecdsa_validator())
    }

    pub(crate) fn from_handle(signer: SignerHandle, validator_address: Address) -> Self {
        Self {
            signer,
            validator_address,
        }
    }

    /// Point at a non-default module deployment
    pub fn with_address(mut self, validator_address: Address) -> Self {
        self.validator_address = validator_address;
        self
    }

    pub fn owner(&self) -> Address {
        self.signer.address()
    }
}

#[async_trait]
impl ValidatorPlugin for EcdsaValidator {
    fn address(&self) -> Address {
        self.validator_address
    }

    /// Owner address, packed
    fn init_data(&self) -> Bytes {
        Bytes::copy_from_slice(self.signer.address().as_slice())
    }

    fn dummy_signature(&self) -> Bytes {
        dummy_ecdsa_signature()
    }

    async fn sign(&self, digest: &B256) -> Result<Bytes> {
        debug!(owner = %self.signer.address(), "Signing with ECDSA validator");
        self.signer.sign(digest).await
    }
}
