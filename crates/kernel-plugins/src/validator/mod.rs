//! Validators
//!
//! A validator is the authorization unit installed on an account. The set of
//! variants is closed so the plugin manager can handle each one exhaustively:
//!
//! - [`EcdsaValidator`]: a single signer
//! - [`WeightedEcdsaValidator`]: several weighted signers and a threshold
//! - [`PermissionValidator`]: a signer gated by an ordered policy list
//!
//! Every variant exposes the same capability through [`ValidatorPlugin`].

pub mod ecdsa;
pub mod permission;
pub mod weighted;

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::signer::{Signer, SignerHandle};
use crate::error::{KernelError, Result};
use crate::policy::Policy;

pub use ecdsa::EcdsaValidator;
pub use permission::{PermissionValidator, PERMISSION_VALIDATOR};
pub use weighted::{
    WeightedEcdsaConfig, WeightedEcdsaValidator, WeightedSigner, WEIGHTED_ECDSA_VALIDATOR,
};

/// Capability every validator variant provides
#[async_trait]
pub trait ValidatorPlugin: Send + Sync {
    /// Validator module contract
    fn address(&self) -> Address;

    /// Data installed into the account's validator slot
    fn init_data(&self) -> Bytes;

    /// Data bound into the enable signature when installed as a regular validator
    fn enable_data(&self) -> Bytes {
        self.init_data()
    }

    /// Placeholder with the byte length of a real signature
    fn dummy_signature(&self) -> Bytes;

    /// Produce a signature over an operation digest
    async fn sign(&self, digest: &B256) -> Result<Bytes>;
}

/// Validator variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    Ecdsa,
    WeightedEcdsa,
    Permission,
}

impl std::fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidatorKind::Ecdsa => write!(f, "ecdsa"),
            ValidatorKind::WeightedEcdsa => write!(f, "weighted_ecdsa"),
            ValidatorKind::Permission => write!(f, "permission"),
        }
    }
}

/// Closed set of validator variants
#[derive(Debug, Clone)]
pub enum Validator {
    Ecdsa(EcdsaValidator),
    WeightedEcdsa(WeightedEcdsaValidator),
    Permission(PermissionValidator),
}

impl Validator {
    pub fn kind(&self) -> ValidatorKind {
        match self {
            Validator::Ecdsa(_) => ValidatorKind::Ecdsa,
            Validator::WeightedEcdsa(_) => ValidatorKind::WeightedEcdsa,
            Validator::Permission(_) => ValidatorKind::Permission,
        }
    }

    fn inner(&self) -> &dyn ValidatorPlugin {
        match self {
            Validator::Ecdsa(validator) => validator,
            Validator::WeightedEcdsa(validator) => validator,
            Validator::Permission(validator) => validator,
        }
    }

    /// Reject validators that must never be enabled on the regular path
    ///
    /// A permission validator without policies would vacuously authorize
    /// everything in its action.
    pub fn check_regular(&self) -> Result<()> {
        match self {
            Validator::Permission(validator) if validator.policies().is_empty() => {
                Err(KernelError::EmptyPolicySet {
                    signer: validator.signer_address(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Non-secret configuration, enough to rebuild a watch-only copy
    pub fn config(&self) -> ValidatorConfig {
        match self {
            Validator::Ecdsa(validator) => ValidatorConfig::Ecdsa {
                validator: validator.address(),
                owner: validator.owner(),
            },
            Validator::WeightedEcdsa(validator) => ValidatorConfig::WeightedEcdsa {
                validator: validator.address(),
                config: validator.config().clone(),
            },
            Validator::Permission(validator) => ValidatorConfig::Permission {
                validator: validator.address(),
                signer: validator.signer_address(),
                policies: validator.policies().to_vec(),
            },
        }
    }

    /// Rebuild a validator from its configuration
    ///
    /// `signer`, when given, must be one of the identities the configuration
    /// names; every other identity comes back watch-only.
    pub fn restore(config: ValidatorConfig, signer: Option<Arc<dyn Signer>>) -> Result<Self> {
        match config {
            ValidatorConfig::Ecdsa { validator, owner } => {
                let handle = attach(owner, signer)?;
                Ok(Validator::Ecdsa(EcdsaValidator::from_handle(handle, validator)))
            }
            ValidatorConfig::WeightedEcdsa { validator, config } => {
                let signers = signer.into_iter().collect();
                Ok(Validator::WeightedEcdsa(
                    WeightedEcdsaValidator::new(config, signers)?.with_address(validator),
                ))
            }
            ValidatorConfig::Permission {
                validator,
                signer: owner,
                policies,
            } => {
                let handle = attach(owner, signer)?;
                Ok(Validator::Permission(
                    PermissionValidator::from_handle(handle, policies)?.with_address(validator),
                ))
            }
        }
    }
}

fn attach(expected: Address, signer: Option<Arc<dyn Signer>>) -> Result<SignerHandle> {
    match signer {
        Some(signer) if signer.address() == expected => Ok(SignerHandle::new(signer)),
        Some(signer) => Err(KernelError::InvalidConfig(format!(
            "signer {} does not match configured identity {expected}",
            signer.address()
        ))),
        None => Ok(SignerHandle::watch_only(expected)),
    }
}

#[async_trait]
impl ValidatorPlugin for Validator {
    fn address(&self) -> Address {
        self.inner().address()
    }

    fn init_data(&self) -> Bytes {
        self.inner().init_data()
    }

    fn enable_data(&self) -> Bytes {
        self.inner().enable_data()
    }

    fn dummy_signature(&self) -> Bytes {
        self.inner().dummy_signature()
    }

    async fn sign(&self, digest: &B256) -> Result<Bytes> {
        self.inner().sign(digest).await
    }
}

impl From<EcdsaValidator> for Validator {
    fn from(validator: EcdsaValidator) -> Self {
        Validator::Ecdsa(validator)
    }
}

impl From<WeightedEcdsaValidator> for Validator {
    fn from(validator: WeightedEcdsaValidator) -> Self {
        Validator::WeightedEcdsa(validator)
    }
}

impl From<PermissionValidator> for Validator {
    fn from(validator: PermissionValidator) -> Self {
        Validator::Permission(validator)
    }
}

/// Serializable, secret-free validator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorConfig {
    Ecdsa {
        validator: Address,
        owner: Address,
    },
    WeightedEcdsa {
        validator: Address,
        config: WeightedEcdsaConfig,
    },
    Permission {
        validator: Address,
        signer: Address,
        policies: Vec<Policy>,
    },
}
