//! Shared test doubles

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use kernel_plugins::{ChainClient, KernelError, LocalSigner, Result, Signer};

/// Signer that counts requests and can be slowed down to widen race windows
pub struct CountingSigner {
    inner: LocalSigner,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingSigner {
    pub fn new(inner: LocalSigner) -> Arc<Self> {
        Self::with_delay(inner, Duration::ZERO)
    }

    pub fn with_delay(inner: LocalSigner, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for CountingSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign(&self, digest: &B256) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.sign(digest).await
    }
}

/// In-memory chain state
#[derive(Default)]
pub struct MemoryChain {
    code: Mutex<HashMap<Address, usize>>,
    nonces: Mutex<HashMap<Address, U256>>,
    sender: Mutex<Option<Address>>,
    offline: bool,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn deploy(&self, address: Address, code_len: usize) {
        self.code.lock().insert(address, code_len);
    }

    pub fn set_nonce(&self, address: Address, nonce: U256) {
        self.nonces.lock().insert(address, nonce);
    }

    pub fn resolve_sender_to(&self, address: Address) {
        *self.sender.lock() = Some(address);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(KernelError::Network("node unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MemoryChain {
    async fn deployed_bytecode_len(&self, address: Address) -> Result<usize> {
        self.check_online()?;
        Ok(self.code.lock().get(&address).copied().unwrap_or(0))
    }

    async fn get_nonce(&self, account: Address) -> Result<U256> {
        self.check_online()?;
        Ok(self
            .nonces
            .lock()
            .get(&account)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn find_sender_address(&self, _init_code: &Bytes) -> Result<Address> {
        self.check_online()?;
        self.sender
            .lock()
            .ok_or_else(|| KernelError::Network("sender simulation reverted".to_string()))
    }
}
