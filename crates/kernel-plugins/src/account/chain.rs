//! Chain collaborator seam

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::error::Result;

/// Read-only view of the chain the account lives on
///
/// Implementations report transport failures as `KernelError::Network`.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Length of the code deployed at `address`, zero before deployment
    async fn deployed_bytecode_len(&self, address: Address) -> Result<usize>;

    /// Next entry point nonce for `account`
    async fn get_nonce(&self, account: Address) -> Result<U256>;

    /// Address the entry point would assign to a sender deployed with `init_code`
    async fn find_sender_address(&self, init_code: &Bytes) -> Result<Address>;
}
