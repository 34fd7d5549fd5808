//! Delegated session hand-off
//!
//! A session packs everything a third party needs to act through an account's
//! delegated validator: the validator configurations, the enable approval and
//! the ephemeral signer's private key. The blob is
//! `base64([SESSION_VERSION] ‖ json)`.
//!
//! Restored accounts are always `Enabled`, so the holder never needs the
//! sudo signer.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::{KernelAccount, KernelAccountParams};
use crate::crypto::signer::{LocalSigner, Signer};
use crate::error::{KernelError, Result};
use crate::plugin::{PluginManager, PluginManagerConfig, ValidityWindow};
use crate::types::{Action, KernelVersion};
use crate::validator::{Validator, ValidatorConfig};

/// Current session blob format
pub const SESSION_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionPayload {
    params: KernelAccountParams,
    account: Address,
    chain_id: u64,
    version: KernelVersion,
    sudo: ValidatorConfig,
    #[serde(default)]
    regular: Option<ValidatorConfig>,
    #[serde(default)]
    action: Option<Action>,
    #[serde(default)]
    validity: ValidityWindow,
    #[serde(default)]
    enable_signature: Option<Bytes>,
    session_key: String,
}

/// Check that `key` alone can act for the delegated validator
///
/// The holder of a weighted session signs with that one key only, so its
/// weight must reach the threshold by itself.
fn check_session_key(delegated: &ValidatorConfig, key: Address) -> Result<()> {
    let listed = match delegated {
        ValidatorConfig::Ecdsa { owner, .. } => *owner == key,
        ValidatorConfig::Permission { signer, .. } => *signer == key,
        ValidatorConfig::WeightedEcdsa { config, .. } => match config.weight_of(&key) {
            Some(weight) if weight < config.threshold => {
                return Err(KernelError::InsufficientWeight {
                    available: u64::from(weight),
                    threshold: u64::from(config.threshold),
                })
            }
            Some(_) => true,
            None => false,
        },
    };

    if !listed {
        return Err(KernelError::InvalidConfig(format!(
            "session key {key} is not a signer of the delegated validator"
        )));
    }
    Ok(())
}

/// Serialize `account` for hand-off to the holder of `session_key`
///
/// Obtains the enable approval first if the account has a regular validator
/// and it is still pending.
pub async fn serialize(account: &KernelAccount, session_key: &LocalSigner) -> Result<String> {
    let manager = account.manager();
    let sudo = manager.sudo().config();
    let regular = manager.regular().map(Validator::config);

    check_session_key(regular.as_ref().unwrap_or(&sudo), session_key.address())?;

    let enable_signature = match regular {
        Some(_) => Some(account.enable_signature().await?),
        None => None,
    };

    let payload = SessionPayload {
        params: account.params().clone(),
        account: account.address(),
        chain_id: manager.chain_id(),
        version: manager.version(),
        sudo,
        regular,
        action: manager.action(),
        validity: manager.validity(),
        enable_signature,
        session_key: session_key.to_hex(),
    };

    let mut blob = vec![SESSION_VERSION];
    blob.extend_from_slice(&serde_json::to_vec(&payload)?);

    info!(
        account = %payload.account,
        session_signer = %session_key.address(),
        "Serialized session"
    );
    Ok(STANDARD.encode(blob))
}

/// Rebuild an enabled account from a session blob
pub fn deserialize(blob: &str) -> Result<KernelAccount> {
    let raw = STANDARD.decode(blob.trim())?;
    let (version, body) = raw
        .split_first()
        .ok_or_else(|| KernelError::MalformedSession("empty session blob".to_string()))?;
    if *version != SESSION_VERSION {
        return Err(KernelError::DeserializationVersionMismatch {
            found: *version,
            expected: SESSION_VERSION,
        });
    }

    let payload: SessionPayload = serde_json::from_slice(body)?;
    let session_key = LocalSigner::from_hex(&payload.session_key)
        .map_err(|_| KernelError::MalformedSession("invalid session key".to_string()))?;
    let session_signer: Arc<dyn Signer> = Arc::new(session_key);

    let (sudo, regular) = match payload.regular {
        Some(regular_config) => {
            if payload.enable_signature.is_none() {
                return Err(KernelError::MalformedSession(
                    "regular validator without enable signature".to_string(),
                ));
            }
            let regular = restore(regular_config, Some(session_signer))?;
            (restore(payload.sudo, None)?, Some(regular))
        }
        None => (restore(payload.sudo, Some(session_signer))?, None),
    };

    let mut config = PluginManagerConfig::new(sudo, payload.chain_id)
        .with_validity(payload.validity)
        .with_version(payload.version);
    config.regular = regular;
    config.action = payload.action;
    config.enable_signature = payload.enable_signature;

    let manager = PluginManager::new(config)?;
    debug!(account = %payload.account, state = ?manager.state(), "Deserialized session");
    Ok(KernelAccount::at(payload.params, manager, payload.account))
}

fn restore(config: ValidatorConfig, signer: Option<Arc<dyn Signer>>) -> Result<Validator> {
    Validator::restore(config, signer).map_err(|e| match e {
        KernelError::InvalidConfig(reason) => KernelError::MalformedSession(reason),
        other => other,
    })
}
