//! Permission validator: one signer gated by an ordered policy conjunction

use alloy_primitives::{address, Address, Bytes, B256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use tracing::debug;

use super::ValidatorPlugin;
use crate::crypto::signer::{dummy_ecdsa_signature, SignerHandle};
use crate::error::{KernelError, Result};
use crate::policy::{Policy, PolicyParams};

/// Default permission validator deployment
pub const PERMISSION_VALIDATOR: Address = address!("965Bea0f8b65aABD1F5148F64654BbAAfB9d2Efa");

/// Signer plus the policies every authorization must satisfy on-chain
///
/// Policy order is part of the validator's identity: the same policies in a
/// different order produce different init data.
#[derive(Debug, Clone)]
pub struct PermissionValidator {
    signer: SignerHandle,
    policies: Vec<Policy>,
    validator_address: Address,
}

impl PermissionValidator {
    pub fn new(signer: impl Into<SignerHandle>, policies: Vec<Policy>) -> Result<Self> {
        Self::from_handle(signer.into(), policies)
    }

    pub(crate) fn from_handle(signer: SignerHandle, policies: Vec<Policy>) -> Result<Self> {
        for policy in &policies {
            policy.validate()?;
        }
        Ok(Self {
            signer,
            policies,
            validator_address: PERMISSION_VALIDATOR,
        })
    }

    pub fn with_address(mut self, validator_address: Address) -> Self {
        self.validator_address = validator_address;
        self
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }
}

#[async_trait]
impl ValidatorPlugin for PermissionValidator {
    fn address(&self) -> Address {
        self.validator_address
    }

    /// Signer address followed by every policy descriptor, in list order
    fn init_data(&self) -> Bytes {
        let mut out = Vec::with_capacity(20 + 22 * self.policies.len());
        out.extend_from_slice(self.signer.address().as_slice());
        for policy in &self.policies {
            out.extend_from_slice(&policy.descriptor());
        }
        out.into()
    }

    /// `abi.encode(bytes initData, bytes[] policyData)`
    fn enable_data(&self) -> Bytes {
        let policy_data: Vec<Bytes> = self.policies.iter().map(|policy| policy.data()).collect();
        (self.init_data(), policy_data).abi_encode_params().into()
    }

    fn dummy_signature(&self) -> Bytes {
        dummy_ecdsa_signature()
    }

    async fn sign(&self, digest: &B256) -> Result<Bytes> {
        if self.policies.is_empty() {
            return Err(KernelError::EmptyPolicySet {
                signer: self.signer.address(),
            });
        }
        debug!(
            signer = %self.signer.address(),
            policies = self.policies.len(),
            "Signing with permission validator"
        );
        self.signer.sign(digest).await
    }
}
