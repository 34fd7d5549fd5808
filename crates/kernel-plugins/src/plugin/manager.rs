//! Plugin manager
//!
//! Owns the sudo validator, the optional action-scoped regular validator and
//! the enable approval that lets the regular validator act before it is
//! installed on-chain.

use alloy_primitives::{hex, Address, Bytes, B256};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::enable::{enable_envelope, sudo_envelope, EnablePayload, ValidityWindow};
use crate::error::{KernelError, Result};
use crate::types::{Action, KernelVersion, Operation};
use crate::validator::{Validator, ValidatorPlugin};

/// Lifecycle of the regular validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginState {
    /// No regular validator installed
    SudoOnly,
    /// Regular validator configured, approval not obtained yet
    PendingEnable,
    /// Approval obtained and cached
    Enabled,
}

/// Validator an operation is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Sudo,
    Regular,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Sudo => write!(f, "sudo"),
            Route::Regular => write!(f, "regular"),
        }
    }
}

/// Plugin manager construction parameters
#[derive(Debug, Clone)]
pub struct PluginManagerConfig {
    pub sudo: Validator,
    pub regular: Option<Validator>,
    pub action: Option<Action>,
    /// Approval obtained elsewhere, skips the signing round-trip
    pub enable_signature: Option<Bytes>,
    pub validity: ValidityWindow,
    pub chain_id: u64,
    pub version: KernelVersion,
}

impl PluginManagerConfig {
    pub fn new(sudo: impl Into<Validator>, chain_id: u64) -> Self {
        Self {
            sudo: sudo.into(),
            regular: None,
            action: None,
            enable_signature: None,
            validity: ValidityWindow::default(),
            chain_id,
            version: KernelVersion::default(),
        }
    }

    pub fn with_regular(mut self, regular: impl Into<Validator>, action: Action) -> Self {
        self.regular = Some(regular.into());
        self.action = Some(action);
        self
    }

    pub fn with_enable_signature(mut self, signature: impl Into<Bytes>) -> Self {
        self.enable_signature = Some(signature.into());
        self
    }

    pub fn with_validity(mut self, validity: ValidityWindow) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_version(mut self, version: KernelVersion) -> Self {
        self.version = version;
        self
    }
}

#[derive(Debug, Clone)]
struct RegularPlugin {
    validator: Validator,
    action: Action,
}

/// Routes operations between the sudo and regular validators
///
/// A manager belongs to exactly one account: the enable approval it caches is
/// bound to the account address passed on first use.
#[derive(Debug)]
pub struct PluginManager {
    sudo: Validator,
    regular: Option<RegularPlugin>,
    validity: ValidityWindow,
    chain_id: u64,
    version: KernelVersion,
    enable_signature: OnceCell<Bytes>,
}

impl PluginManager {
    pub fn new(config: PluginManagerConfig) -> Result<Self> {
        config.validity.validate()?;

        let regular = match (config.regular, config.action) {
            (Some(validator), Some(action)) => Some(RegularPlugin { validator, action }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(KernelError::InvalidConfig(
                    "regular validator requires an action".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(KernelError::InvalidConfig(
                    "action given without a regular validator".to_string(),
                ))
            }
        };

        let enable_signature = match (&regular, config.enable_signature) {
            (Some(_), Some(signature)) => OnceCell::new_with(Some(signature)),
            (None, Some(_)) => {
                return Err(KernelError::InvalidConfig(
                    "enable signature given without a regular validator".to_string(),
                ))
            }
            (_, None) => OnceCell::new(),
        };

        Ok(Self {
            sudo: config.sudo,
            regular,
            validity: config.validity,
            chain_id: config.chain_id,
            version: config.version,
            enable_signature,
        })
    }

    pub fn state(&self) -> PluginState {
        match (&self.regular, self.enable_signature.initialized()) {
            (None, _) => PluginState::SudoOnly,
            (Some(_), false) => PluginState::PendingEnable,
            (Some(_), true) => PluginState::Enabled,
        }
    }

    pub fn sudo(&self) -> &Validator {
        &self.sudo
    }

    pub fn regular(&self) -> Option<&Validator> {
        self.regular.as_ref().map(|plugin| &plugin.validator)
    }

    pub fn action(&self) -> Option<Action> {
        self.regular.as_ref().map(|plugin| plugin.action)
    }

    pub fn validity(&self) -> ValidityWindow {
        self.validity
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn version(&self) -> KernelVersion {
        self.version
    }

    /// Enable approval if it has already been obtained
    pub fn cached_enable_signature(&self) -> Option<Bytes> {
        self.enable_signature.get().cloned()
    }

    /// Decide which validator authorizes `operation`
    pub fn route(&self, account: Address, operation: &Operation) -> Result<Route> {
        let Some(regular) = &self.regular else {
            return Ok(Route::Sudo);
        };

        let selector = operation.selector();
        if regular.action.matches(operation.target, selector) {
            return Ok(Route::Regular);
        }
        if operation.target == account {
            return Ok(Route::Sudo);
        }

        warn!(
            target_address = %operation.target,
            selector = %hex::encode(selector),
            action = %regular.action,
            "Operation outside the regular validator's action"
        );
        Err(KernelError::ActionNotPermitted {
            target: operation.target,
            selector: hex::encode(selector),
        })
    }

    /// What the sudo validator approves for the regular validator
    pub fn enable_payload(&self) -> Result<EnablePayload> {
        let regular = self.regular.as_ref().ok_or_else(|| {
            KernelError::EnableSignatureUnavailable("no regular validator installed".to_string())
        })?;

        Ok(EnablePayload {
            validator: regular.validator.address(),
            executor: regular.action.target,
            selector: regular.action.selector,
            validity: self.validity,
            enable_data: regular.validator.enable_data(),
        })
    }

    /// Enable approval for the regular validator, obtained at most once
    ///
    /// Concurrent first callers share one in-flight request to the sudo
    /// validator. A failed request leaves the cache empty.
    pub async fn enable_signature(&self, account: Address) -> Result<Bytes> {
        let payload = self.enable_payload()?;
        self.regular_validator()?.check_regular()?;

        let signature = self
            .enable_signature
            .get_or_try_init(|| async {
                let digest = payload.digest(account, self.chain_id, self.version);
                info!(
                    account = %account,
                    validator = %payload.validator,
                    executor = %payload.executor,
                    "Requesting enable signature from sudo validator"
                );
                self.sudo.sign(&digest).await.map_err(|e| {
                    warn!(account = %account, error = %e, "Sudo validator could not sign enable payload");
                    KernelError::EnableSignatureUnavailable(e.to_string())
                })
            })
            .await?;

        Ok(signature.clone())
    }

    /// Authorize `operation` over `digest`, returning the full signature envelope
    pub async fn authorize(
        &self,
        account: Address,
        operation: &Operation,
        digest: &B256,
    ) -> Result<Bytes> {
        let route = self.route(account, operation)?;
        debug!(route = %route, target_address = %operation.target, "Authorizing operation");

        match route {
            Route::Sudo => {
                let signature = self.sudo.sign(digest).await?;
                Ok(sudo_envelope(&signature))
            }
            Route::Regular => {
                let payload = self.enable_payload()?;
                let enable_signature = self.enable_signature(account).await?;
                let signature = self.regular_validator()?.sign(digest).await?;
                Ok(enable_envelope(&payload, &enable_signature, &signature))
            }
        }
    }

    /// Placeholder envelope of the same length `authorize` would return
    ///
    /// Never signs: a missing enable approval is stood in for by the sudo
    /// validator's dummy signature.
    pub fn dummy_signature(&self, account: Address, operation: &Operation) -> Result<Bytes> {
        match self.route(account, operation)? {
            Route::Sudo => Ok(sudo_envelope(&self.sudo.dummy_signature())),
            Route::Regular => {
                let payload = self.enable_payload()?;
                let enable_signature = self
                    .cached_enable_signature()
                    .unwrap_or_else(|| self.sudo.dummy_signature());
                let dummy = self.regular_validator()?.dummy_signature();
                Ok(enable_envelope(&payload, &enable_signature, &dummy))
            }
        }
    }

    fn regular_validator(&self) -> Result<&Validator> {
        self.regular()
            .ok_or_else(|| KernelError::InvalidConfig("no regular validator installed".to_string()))
    }
}
