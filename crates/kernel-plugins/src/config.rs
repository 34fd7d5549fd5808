//! Kernel account configuration

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::account::{KernelAccountParams, ENTRY_POINT_V06, KERNEL_FACTORY, KERNEL_IMPLEMENTATION};
use crate::error::{KernelError, Result};
use crate::plugin::ValidityWindow;
use crate::types::KernelVersion;

/// Chain and deployment settings shared by the accounts a process builds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelConfig {
    pub chain_id: u64,
    pub entry_point: Address,
    pub factory: Address,
    pub implementation: Address,
    pub index: U256,
    pub version: KernelVersion,
    /// Window applied to enable approvals
    pub enable_validity: ValidityWindow,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            entry_point: ENTRY_POINT_V06,
            factory: KERNEL_FACTORY,
            implementation: KERNEL_IMPLEMENTATION,
            index: U256::ZERO,
            version: KernelVersion::default(),
            enable_validity: ValidityWindow::default(),
        }
    }
}

impl KernelConfig {
    /// Load configuration from `.env` and `KERNEL_*` environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Some(v) = env_parse("KERNEL_CHAIN_ID")? {
            cfg.chain_id = v;
        }
        if let Some(v) = env_parse("KERNEL_ENTRY_POINT")? {
            cfg.entry_point = v;
        }
        if let Some(v) = env_parse("KERNEL_FACTORY")? {
            cfg.factory = v;
        }
        if let Some(v) = env_parse("KERNEL_IMPLEMENTATION")? {
            cfg.implementation = v;
        }
        if let Some(v) = env_parse("KERNEL_INDEX")? {
            cfg.index = v;
        }
        if let Some(v) = env_parse("KERNEL_VERSION")? {
            cfg.version = v;
        }

        // Enable approval window
        if let Some(v) = env_parse("KERNEL_ENABLE_VALID_AFTER")? {
            cfg.enable_validity.valid_after = v;
        }
        if let Some(v) = env_parse("KERNEL_ENABLE_VALID_UNTIL")? {
            cfg.enable_validity.valid_until = v;
        }
        cfg.enable_validity.validate()?;

        Ok(cfg)
    }

    /// Deployment coordinates for an account
    pub fn account_params(&self) -> KernelAccountParams {
        KernelAccountParams {
            factory: self.factory,
            implementation: self.implementation,
            entry_point: self.entry_point,
            index: self.index,
        }
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| KernelError::InvalidConfig(format!("{key}: {e}"))),
        Err(_) => Ok(None),
    }
}
