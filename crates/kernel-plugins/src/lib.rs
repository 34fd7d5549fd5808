//! # Kernel Plugins
//!
//! Validator composition and delegated authorization for Kernel smart accounts.
//!
//! ## Validators
//!
//! - [`EcdsaValidator`]: a single secp256k1 signer
//! - [`WeightedEcdsaValidator`]: weighted signers under a threshold
//! - [`PermissionValidator`]: a signer gated by an ordered list of [`Policy`]
//!
//! ## Composition
//!
//! - [`PluginManager`]: routes operations between the sudo validator and an
//!   action-scoped regular validator, and obtains the sudo approval that
//!   enables the regular one
//! - [`KernelAccount`]: counterfactual address, init code and call data
//! - [`session`]: hands a delegated authorization to a third party
//!
//! Signing and chain access are collaborators behind [`Signer`] and
//! [`ChainClient`].

pub mod account;
pub mod config;
pub mod crypto;
pub mod error;
pub mod plugin;
pub mod policy;
pub mod session;
pub mod types;
pub mod validator;

// Re-export commonly used types at crate root
pub use account::{ChainClient, KernelAccount, KernelAccountParams};
pub use config::KernelConfig;
pub use crypto::{AbiCodec, CallCodec, LocalSigner, Signer, SignerHandle};
pub use error::{KernelError, Result};
pub use plugin::{PluginManager, PluginManagerConfig, PluginState, Route, ValidityWindow};
pub use policy::{
    GasPolicy, Policy, PolicyFlag, PolicyParams, RateLimitPolicy, SudoPolicy, TimestampPolicy,
};
pub use types::{Action, CallType, Execution, KernelVersion, Operation};
pub use validator::{
    EcdsaValidator, PermissionValidator, Validator, ValidatorConfig, ValidatorPlugin,
    WeightedEcdsaConfig, WeightedEcdsaValidator, WeightedSigner,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
