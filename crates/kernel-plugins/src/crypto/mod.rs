//! Cryptographic collaborators
//!
//! This module provides:
//! - Signers: the `sign(digest) -> signature` capability of one authority
//! - The contract-call codec used to build init code and call data

pub mod abi;
pub mod signer;

pub use abi::{AbiCodec, CallCodec, KernelCall};
pub use signer::{LocalSigner, Signer, SignerHandle};
