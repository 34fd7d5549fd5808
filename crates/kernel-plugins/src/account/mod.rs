//! Kernel smart account
//!
//! A [`KernelAccount`] binds a [`PluginManager`] to the counterfactual address
//! derived from its sudo validator. Everything here is usable before the
//! account is deployed; only init-code inclusion depends on chain state.

pub mod address;
pub mod calls;
pub mod chain;

use std::sync::Arc;

use alloy_primitives::{address, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crypto::abi::{AbiCodec, CallCodec};
use crate::error::{KernelError, Result};
use crate::plugin::PluginManager;
use crate::types::{Execution, Operation};
use crate::validator::ValidatorPlugin;

pub use calls::CREATE_CALL;
pub use chain::ChainClient;

/// ERC-4337 entry point v0.6
pub const ENTRY_POINT_V06: Address = address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

/// Kernel account factory
pub const KERNEL_FACTORY: Address = address!("5de4839a76cf55d0c90e2061ef4386d962E15ae3");

/// Kernel v2.3 account logic
pub const KERNEL_IMPLEMENTATION: Address = address!("D3F582F6B4814E989Ee8E96bc3175320B5A540ab");

/// Deployment coordinates of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelAccountParams {
    pub factory: Address,
    pub implementation: Address,
    pub entry_point: Address,
    /// Distinguishes several accounts with the same sudo validator
    pub index: U256,
}

impl Default for KernelAccountParams {
    fn default() -> Self {
        Self {
            factory: KERNEL_FACTORY,
            implementation: KERNEL_IMPLEMENTATION,
            entry_point: ENTRY_POINT_V06,
            index: U256::ZERO,
        }
    }
}

impl KernelAccountParams {
    pub fn with_index(mut self, index: impl Into<U256>) -> Self {
        self.index = index.into();
        self
    }
}

/// Smart account driven by a plugin manager
pub struct KernelAccount {
    params: KernelAccountParams,
    manager: Arc<PluginManager>,
    address: Address,
    codec: Arc<dyn CallCodec>,
}

impl std::fmt::Debug for KernelAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelAccount")
            .field("address", &self.address)
            .field("params", &self.params)
            .field("state", &self.manager.state())
            .finish_non_exhaustive()
    }
}

impl KernelAccount {
    /// Account at its locally derived counterfactual address
    pub fn new(params: KernelAccountParams, manager: impl Into<Arc<PluginManager>>) -> Result<Self> {
        Self::with_codec(params, manager, Arc::new(AbiCodec))
    }

    /// Same as [`KernelAccount::new`] with a custom call codec
    pub fn with_codec(
        params: KernelAccountParams,
        manager: impl Into<Arc<PluginManager>>,
        codec: Arc<dyn CallCodec>,
    ) -> Result<Self> {
        let mut account = Self {
            params,
            manager: manager.into(),
            address: Address::ZERO,
            codec,
        };
        account.address = account.compute_address()?;
        debug!(account = %account.address, "Derived counterfactual account address");
        Ok(account)
    }

    /// Account known to live at `address`
    pub fn at(
        params: KernelAccountParams,
        manager: impl Into<Arc<PluginManager>>,
        address: Address,
    ) -> Self {
        Self {
            params,
            manager: manager.into(),
            address,
            codec: Arc::new(AbiCodec),
        }
    }

    /// Resolve the address through the chain, unless it is already known
    pub async fn connect(
        params: KernelAccountParams,
        manager: impl Into<Arc<PluginManager>>,
        chain: &dyn ChainClient,
        deployed: Option<Address>,
    ) -> Result<Self> {
        let manager: Arc<PluginManager> = manager.into();
        if let Some(address) = deployed {
            return Ok(Self::at(params, manager, address));
        }

        let mut account = Self::new(params, manager)?;
        let init_code = account.build_init_code()?;
        let resolved = chain
            .find_sender_address(&init_code)
            .await
            .map_err(|e| KernelError::AddressResolutionFailed(e.to_string()))?;

        if resolved != account.address {
            debug!(
                local = %account.address,
                resolved = %resolved,
                "Entry point resolved a different sender address"
            );
        }
        account.address = resolved;
        Ok(account)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn params(&self) -> &KernelAccountParams {
        &self.params
    }

    pub fn manager(&self) -> &PluginManager {
        &self.manager
    }

    fn initialize_call(&self) -> Result<Bytes> {
        let sudo = self.manager.sudo();
        address::initialize_call(self.codec.as_ref(), sudo.address(), sudo.init_data())
    }

    /// Counterfactual address; a pure function of the params and the sudo validator
    pub fn compute_address(&self) -> Result<Address> {
        let initialize = self.initialize_call()?;
        Ok(address::counterfactual_address(
            self.params.factory,
            self.params.implementation,
            &initialize,
            self.params.index,
        ))
    }

    /// Deploy-and-initialize code; byte-identical across calls
    pub fn build_init_code(&self) -> Result<Bytes> {
        address::init_code(
            self.codec.as_ref(),
            self.params.factory,
            self.params.implementation,
            self.initialize_call()?,
            self.params.index,
        )
    }

    /// Init code to attach to the next operation, empty once deployed
    pub async fn init_code(&self, chain: &dyn ChainClient) -> Result<Bytes> {
        let code_len = chain.deployed_bytecode_len(self.address).await?;
        if code_len > 0 {
            debug!(account = %self.address, code_len, "Account deployed, omitting init code");
            return Ok(Bytes::new());
        }
        self.build_init_code()
    }

    pub async fn nonce(&self, chain: &dyn ChainClient) -> Result<U256> {
        chain.get_nonce(self.address).await
    }

    /// Signature envelope authorizing `operation` over `digest`
    pub async fn authorize(&self, operation: &Operation, digest: &B256) -> Result<Bytes> {
        self.manager.authorize(self.address, operation, digest).await
    }

    /// Placeholder envelope for cost estimation
    pub fn dummy_signature(&self, operation: &Operation) -> Result<Bytes> {
        self.manager.dummy_signature(self.address, operation)
    }

    /// Enable approval for the regular validator
    pub async fn enable_signature(&self) -> Result<Bytes> {
        self.manager.enable_signature(self.address).await
    }

    pub fn encode_call_data(&self, execution: &Execution) -> Result<Bytes> {
        calls::encode_execution(self.codec.as_ref(), self.address, execution)
    }

    /// Call data deploying `bytecode` from the account
    pub fn encode_deploy_call_data(&self, bytecode: &Bytes) -> Result<Bytes> {
        info!(account = %self.address, size = bytecode.len(), "Encoding contract deployment");
        calls::encode_deploy(self.codec.as_ref(), bytecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signer::LocalSigner;
    use crate::plugin::PluginManagerConfig;
    use crate::types::KernelVersion;
    use crate::validator::EcdsaValidator;

    fn account_for(signer: LocalSigner, index: u64) -> KernelAccount {
        let sudo = EcdsaValidator::new(signer, KernelVersion::V0_2_3);
        let manager = PluginManager::new(PluginManagerConfig::new(sudo, 1)).unwrap();
        KernelAccount::new(KernelAccountParams::default().with_index(U256::from(index)), manager).unwrap()
    }

    #[test]
    fn test_address_is_deterministic() {
        let signer = LocalSigner::random();
        let first = account_for(signer.clone(), 0);
        let second = account_for(signer.clone(), 0);
        assert_eq!(first.address(), second.address());
        assert_eq!(first.compute_address().unwrap(), first.address());

        let other_index = account_for(signer, 1);
        assert_ne!(first.address(), other_index.address());
    }

    #[test]
    fn test_init_code_idempotent() {
        let account = account_for(LocalSigner::random(), 0);
        assert_eq!(account.build_init_code().unwrap(), account.build_init_code().unwrap());
        assert_eq!(&account.build_init_code().unwrap()[..20], KERNEL_FACTORY.as_slice());
    }
}
