//! Error types for Kernel plugin composition
//!
//! Every variant describes a caller-side misconfiguration or a structurally
//! invalid request. Nothing here is retried internally.

use alloy_primitives::Address;
use thiserror::Error;

/// Result type alias using KernelError
pub type Result<T> = std::result::Result<T, KernelError>;

/// Unified error type for authorization and account construction
#[derive(Debug, Error)]
pub enum KernelError {
    // Policy errors
    #[error("Invalid parameters for {policy} policy: {reason}")]
    InvalidPolicyParams { policy: String, reason: String },

    #[error("Permission validator for signer {signer} has no policies attached")]
    EmptyPolicySet { signer: Address },

    // Validator errors
    #[error("Insufficient signer weight: {available} available, {threshold} required")]
    InsufficientWeight { available: u64, threshold: u64 },

    #[error("Signer {signer} unavailable: {reason}")]
    SignerUnavailable { signer: Address, reason: String },

    // Routing errors
    #[error("Action not permitted for regular validator: target {target}, selector 0x{selector}")]
    ActionNotPermitted { target: Address, selector: String },

    #[error("Enable signature unavailable: {0}")]
    EnableSignatureUnavailable(String),

    // Call encoding errors
    #[error("Delegatecall cannot be batched (element {index})")]
    DelegatecallNotBatchable { index: usize },

    #[error("ABI codec error: {0}")]
    Codec(String),

    // Chain collaborator errors
    #[error("Account address resolution failed: {0}")]
    AddressResolutionFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    // Session errors
    #[error("Session version mismatch: found {found}, expected {expected}")]
    DeserializationVersionMismatch { found: u8, expected: u8 },

    #[error("Malformed session: {0}")]
    MalformedSession(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl KernelError {
    /// Shorthand for a policy parameter failure
    pub fn invalid_policy(policy: &str, reason: impl Into<String>) -> Self {
        KernelError::InvalidPolicyParams {
            policy: policy.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a signer capability failure
    pub fn signer_unavailable(signer: Address, reason: impl Into<String>) -> Self {
        KernelError::SignerUnavailable {
            signer,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for KernelError {
    fn from(err: serde_json::Error) -> Self {
        KernelError::MalformedSession(err.to_string())
    }
}

impl From<alloy_sol_types::Error> for KernelError {
    fn from(err: alloy_sol_types::Error) -> Self {
        KernelError::Codec(err.to_string())
    }
}

impl From<base64::DecodeError> for KernelError {
    fn from(err: base64::DecodeError) -> Self {
        KernelError::MalformedSession(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KernelError::InsufficientWeight {
            available: 100,
            threshold: 101,
        };
        assert!(err.to_string().contains("100 available, 101 required"));
    }

    #[test]
    fn test_action_error_carries_context() {
        let err = KernelError::ActionNotPermitted {
            target: Address::ZERO,
            selector: "b61d27f6".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("0xb61d27f6"));
        assert!(rendered.contains(&Address::ZERO.to_string()));
    }

    #[test]
    fn test_json_error_maps_to_malformed_session() {
        let err: KernelError = serde_json::from_str::<u8>("not json").unwrap_err().into();
        assert!(matches!(err, KernelError::MalformedSession(_)));
    }
}
