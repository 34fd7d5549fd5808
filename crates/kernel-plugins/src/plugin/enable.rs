//! Enable payload digest and signature envelopes
//!
//! The sudo validator approves a regular validator by signing an EIP-712
//! `ValidatorApproved` struct bound to the account. The approval travels
//! inside the regular path's signature envelope until the account has
//! installed the validator on-chain.

use std::borrow::Cow;

use alloy_primitives::{Address, Bytes, Selector, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};

use crate::crypto::abi::ValidatorApproved;
use crate::error::{KernelError, Result};
use crate::policy::MAX_UINT48;
use crate::types::KernelVersion;

/// Signature envelope mode for the sudo path
pub const SUDO_MODE: [u8; 4] = [0x00, 0x00, 0x00, 0x00];

/// Signature envelope mode for a regular validator carrying its enable approval
pub const ENABLE_MODE: [u8; 4] = [0x00, 0x00, 0x00, 0x02];

const DOMAIN_NAME: &str = "Kernel";

/// Window in which an enable approval is accepted, unix seconds
///
/// `valid_until == 0` means the approval never expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub valid_after: u64,
    pub valid_until: u64,
}

impl ValidityWindow {
    pub fn new(valid_after: u64, valid_until: u64) -> Result<Self> {
        let window = Self {
            valid_after,
            valid_until,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.valid_after > MAX_UINT48 || self.valid_until > MAX_UINT48 {
            return Err(KernelError::InvalidConfig(
                "validity window must fit in uint48".to_string(),
            ));
        }
        if self.valid_until != 0 && self.valid_until <= self.valid_after {
            return Err(KernelError::InvalidConfig(format!(
                "valid_until {} must be after valid_after {}",
                self.valid_until, self.valid_after
            )));
        }
        Ok(())
    }
}

/// Everything the sudo validator approves when enabling a regular validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnablePayload {
    pub validator: Address,
    pub executor: Address,
    pub selector: Selector,
    pub validity: ValidityWindow,
    pub enable_data: Bytes,
}

impl EnablePayload {
    /// `validUntil << 208 | validAfter << 160 | validator`
    pub fn validator_data(&self) -> U256 {
        (U256::from(self.validity.valid_until) << 208)
            | (U256::from(self.validity.valid_after) << 160)
            | U256::from_be_slice(self.validator.as_slice())
    }

    /// EIP-712 digest the sudo validator signs
    pub fn digest(&self, account: Address, chain_id: u64, version: KernelVersion) -> B256 {
        let domain = Eip712Domain::new(
            Some(Cow::Borrowed(DOMAIN_NAME)),
            Some(Cow::Borrowed(version.as_str())),
            Some(U256::from(chain_id)),
            Some(account),
            None,
        );

        ValidatorApproved {
            sig: self.selector,
            validatorData: self.validator_data(),
            executor: self.executor,
            enableData: self.enable_data.clone(),
        }
        .eip712_signing_hash(&domain)
    }
}

/// `0x00000000 ‖ signature`
pub fn sudo_envelope(signature: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(4 + signature.len());
    out.extend_from_slice(&SUDO_MODE);
    out.extend_from_slice(signature);
    out.into()
}

/// Regular-path envelope carrying the enable approval ahead of the signature
///
/// `0x00000002 ‖ validUntil(6) ‖ validAfter(6) ‖ validator(20) ‖ executor(20)
/// ‖ len(32) ‖ enableData ‖ len(32) ‖ enableSignature ‖ signature`
pub fn enable_envelope(payload: &EnablePayload, enable_signature: &[u8], signature: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(
        4 + 6 + 6 + 20 + 20 + 32 + payload.enable_data.len() + 32 + enable_signature.len()
            + signature.len(),
    );
    out.extend_from_slice(&ENABLE_MODE);
    out.extend_from_slice(&uint48_bytes(payload.validity.valid_until));
    out.extend_from_slice(&uint48_bytes(payload.validity.valid_after));
    out.extend_from_slice(payload.validator.as_slice());
    out.extend_from_slice(payload.executor.as_slice());
    out.extend_from_slice(&U256::from(payload.enable_data.len()).to_be_bytes::<32>());
    out.extend_from_slice(&payload.enable_data);
    out.extend_from_slice(&U256::from(enable_signature.len()).to_be_bytes::<32>());
    out.extend_from_slice(enable_signature);
    out.extend_from_slice(signature);
    out.into()
}

fn uint48_bytes(value: u64) -> [u8; 6] {
    let full = value.to_be_bytes();
    let mut out = [0u8; 6];
    out.copy_from_slice(&full[2..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> EnablePayload {
        EnablePayload {
            validator: Address::repeat_byte(0x11),
            executor: Address::repeat_byte(0x22),
            selector: Selector::from([0x51, 0x94, 0x54, 0x47]),
            validity: ValidityWindow::new(10, 20).unwrap(),
            enable_data: Bytes::from(vec![0xaa; 3]),
        }
    }

    #[test]
    fn test_validator_data_packing() {
        let data = payload().validator_data().to_be_bytes::<32>();
        assert_eq!(&data[..6], &[0, 0, 0, 0, 0, 20]);
        assert_eq!(&data[6..12], &[0, 0, 0, 0, 0, 10]);
        assert_eq!(&data[12..], Address::repeat_byte(0x11).as_slice());
    }

    #[test]
    fn test_digest_binds_account_and_chain() {
        let payload = payload();
        let account = Address::repeat_byte(0x33);
        let base = payload.digest(account, 1, KernelVersion::V0_2_3);

        assert_eq!(base, payload.digest(account, 1, KernelVersion::V0_2_3));
        assert_ne!(base, payload.digest(Address::repeat_byte(0x44), 1, KernelVersion::V0_2_3));
        assert_ne!(base, payload.digest(account, 137, KernelVersion::V0_2_3));
        assert_ne!(base, payload.digest(account, 1, KernelVersion::V0_2_4));
    }

    #[test]
    fn test_approval_type_string() {
        assert_eq!(
            ValidatorApproved::eip712_encode_type(),
            "ValidatorApproved(bytes4 sig,uint256 validatorData,address executor,bytes enableData)"
        );
    }

    #[test]
    fn test_enable_envelope_layout() {
        let payload = payload();
        let envelope = enable_envelope(&payload, &[0xbb; 65], &[0xcc; 65]);

        assert_eq!(&envelope[..4], &ENABLE_MODE);
        assert_eq!(&envelope[4..10], &[0, 0, 0, 0, 0, 20]);
        assert_eq!(&envelope[10..16], &[0, 0, 0, 0, 0, 10]);
        assert_eq!(&envelope[16..36], payload.validator.as_slice());
        assert_eq!(&envelope[36..56], payload.executor.as_slice());
        assert_eq!(envelope[87], 3);
        assert_eq!(&envelope[88..91], &[0xaa; 3]);
        assert_eq!(envelope[122], 65);
        assert_eq!(envelope.len(), 123 + 65 + 65);
    }

    #[test]
    fn test_window_validation() {
        assert!(ValidityWindow::new(0, 0).is_ok());
        assert!(ValidityWindow::new(5, 5).is_err());
        assert!(ValidityWindow::new(0, MAX_UINT48 + 1).is_err());
    }
}
