//! Weighted multi-signer ECDSA validator
//!
//! Signers are weighted; an operation is valid on-chain once the weights of
//! the signers that produced a signature reach the threshold. Locally the
//! validator only assembles the aggregate, always in ascending signer address
//! order so repeated authorizations over the same digest are byte-identical.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{address, Address, Bytes, B256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ValidatorPlugin;
use crate::crypto::signer::{dummy_ecdsa_signature, Signer, SignerHandle};
use crate::error::{KernelError, Result};
use crate::policy::MAX_UINT48;

/// Default weighted ECDSA validator deployment
pub const WEIGHTED_ECDSA_VALIDATOR: Address =
    address!("eD89244160CfE273800B58b1B534031699dFeEEE");

const MAX_UINT24: u32 = (1 << 24) - 1;

/// One guardian and its voting weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedSigner {
    pub address: Address,
    pub weight: u32,
}

/// On-chain configuration of a weighted validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedEcdsaConfig {
    pub threshold: u32,
    /// Approval delay in seconds; recorded on-chain, never enforced locally
    #[serde(default)]
    pub delay: u64,
    pub signers: Vec<WeightedSigner>,
}

impl WeightedEcdsaConfig {
    pub fn total_weight(&self) -> u64 {
        self.signers.iter().map(|s| u64::from(s.weight)).sum()
    }

    /// Weight of `signer`, if the configuration names it
    pub fn weight_of(&self, signer: &Address) -> Option<u32> {
        self.signers
            .iter()
            .find(|s| s.address == *signer)
            .map(|s| s.weight)
    }

    fn validate(&self) -> Result<()> {
        if self.signers.is_empty() {
            return Err(KernelError::InvalidConfig(
                "weighted validator needs at least one signer".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.signers.len());
        for signer in &self.signers {
            if !seen.insert(signer.address) {
                return Err(KernelError::InvalidConfig(format!(
                    "duplicate weighted signer {}",
                    signer.address
                )));
            }
            if signer.weight == 0 || signer.weight > MAX_UINT24 {
                return Err(KernelError::InvalidConfig(format!(
                    "weight of {} must be in 1..=uint24",
                    signer.address
                )));
            }
        }

        if self.threshold == 0 || self.threshold > MAX_UINT24 {
            return Err(KernelError::InvalidConfig(
                "threshold must be in 1..=uint24".to_string(),
            ));
        }
        if self.delay > MAX_UINT48 {
            return Err(KernelError::InvalidConfig(
                "delay must fit in uint48".to_string(),
            ));
        }

        let total = self.total_weight();
        if total < u64::from(self.threshold) {
            return Err(KernelError::InsufficientWeight {
                available: total,
                threshold: u64::from(self.threshold),
            });
        }
        Ok(())
    }
}

/// Validator aggregating signatures from several weighted signers
#[derive(Debug, Clone)]
pub struct WeightedEcdsaValidator {
    config: WeightedEcdsaConfig,
    /// Keyed by address, so iteration is ascending identity order
    handles: BTreeMap<Address, SignerHandle>,
    validator_address: Address,
}

impl WeightedEcdsaValidator {
    /// Build from the configuration and the signing capabilities available locally
    ///
    /// Signers named in the configuration but absent from `signers` stay
    /// watch-only. A capability for an address the configuration does not
    /// name is rejected.
    pub fn new(config: WeightedEcdsaConfig, signers: Vec<Arc<dyn Signer>>) -> Result<Self> {
        config.validate()?;

        let mut handles: BTreeMap<Address, SignerHandle> = config
            .signers
            .iter()
            .map(|s| (s.address, SignerHandle::watch_only(s.address)))
            .collect();

        for signer in signers {
            let address = signer.address();
            match handles.get_mut(&address) {
                Some(slot) => *slot = SignerHandle::new(signer),
                None => {
                    return Err(KernelError::InvalidConfig(format!(
                        "signer {address} is not part of the weighted configuration"
                    )))
                }
            }
        }

        Ok(Self {
            config,
            handles,
            validator_address: WEIGHTED_ECDSA_VALIDATOR,
        })
    }

    pub fn with_address(mut self, validator_address: Address) -> Self {
        self.validator_address = validator_address;
        self
    }

    pub fn config(&self) -> &WeightedEcdsaConfig {
        &self.config
    }

    /// Whether the on-chain validator imposes an approval window
    pub fn requires_approval_delay(&self) -> bool {
        self.config.delay > 0
    }

    /// Weight of the signers this instance can actually sign with
    pub fn accessible_weight(&self) -> u64 {
        self.handles
            .iter()
            .filter(|(_, handle)| handle.is_available())
            .filter_map(|(address, _)| self.config.weight_of(address))
            .map(u64::from)
            .sum()
    }

    fn available(&self) -> impl Iterator<Item = (&Address, &SignerHandle)> {
        self.handles.iter().filter(|(_, handle)| handle.is_available())
    }
}

#[async_trait]
impl ValidatorPlugin for WeightedEcdsaValidator {
    fn address(&self) -> Address {
        self.validator_address
    }

    /// `abi.encode(address[] guardians, uint24[] weights, uint24 threshold, uint48 delay)`
    fn init_data(&self) -> Bytes {
        let mut signers = self.config.signers.clone();
        signers.sort_by_key(|s| s.address);

        let addresses: Vec<Address> = signers.iter().map(|s| s.address).collect();
        let weights: Vec<u32> = signers.iter().map(|s| s.weight).collect();

        (addresses, weights, self.config.threshold, self.config.delay)
            .abi_encode_params()
            .into()
    }

    fn dummy_signature(&self) -> Bytes {
        let dummy = dummy_ecdsa_signature();
        let mut out = Vec::new();
        for (address, _) in self.available() {
            out.extend_from_slice(address.as_slice());
            out.extend_from_slice(&dummy);
        }
        out.into()
    }

    async fn sign(&self, digest: &B256) -> Result<Bytes> {
        let available = self.accessible_weight();
        let threshold = u64::from(self.config.threshold);
        if available < threshold {
            warn!(available, threshold, "Weighted validator below threshold");
            return Err(KernelError::InsufficientWeight {
                available,
                threshold,
            });
        }

        let signers: Vec<_> = self.available().collect();
        debug!(signers = signers.len(), available, threshold, "Collecting weighted signatures");

        // try_join_all yields results in input order, whatever the completion order
        let signatures =
            try_join_all(signers.iter().map(|(_, handle)| handle.sign(digest))).await?;

        let mut out = Vec::new();
        for ((address, _), signature) in signers.iter().zip(signatures) {
            out.extend_from_slice(address.as_slice());
            out.extend_from_slice(&signature);
        }
        Ok(out.into())
    }
}
