//! Permission policies
//!
//! A policy is an immutable predicate evaluated on-chain by a policy
//! contract. Locally it only has to produce two deterministic encodings:
//! - `data()`: the evaluator's parameters, ABI-encoded
//! - `descriptor()`: 2-byte flag followed by the evaluator address
//!
//! Parameters are validated at construction and again after a session is
//! deserialized, so an out-of-range value never reaches an encoding.

pub mod gas;
pub mod rate_limit;
pub mod timestamp;

use alloy_primitives::{address, Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use gas::GasPolicy;
pub use rate_limit::RateLimitPolicy;
pub use timestamp::TimestampPolicy;

/// Gas spending policy evaluator
pub const GAS_POLICY_CONTRACT: Address = address!("aeFC5AbC67FfD258abD0A3E54f65E70326F84b23");

/// Unrestricted policy evaluator
pub const SUDO_POLICY_CONTRACT: Address = address!("67b436caD8a6D025DF6C82C5BB43fbF11fC5B9B7");

/// Validity window policy evaluator
pub const TIMESTAMP_POLICY_CONTRACT: Address =
    address!("B9f8f524bE6EcD8C945b1b87f9ae5C192FdCE20F");

/// Call rate policy evaluator
pub const RATE_LIMIT_POLICY_CONTRACT: Address =
    address!("f63d4139B25c836334edD76641356c6b74C86873");

/// Largest value a `uint48` parameter can carry
pub const MAX_UINT48: u64 = (1 << 48) - 1;

/// Which validation paths a policy participates in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyFlag {
    /// Checked for user operations and signatures
    #[default]
    ForAllValidation,
    /// Skipped when validating user operations
    NotForValidateUserOp,
    /// Skipped when validating ERC-1271 signatures
    NotForValidateSig,
}

impl PolicyFlag {
    pub fn to_bytes(self) -> [u8; 2] {
        match self {
            PolicyFlag::ForAllValidation => [0x00, 0x00],
            PolicyFlag::NotForValidateUserOp => [0x00, 0x01],
            PolicyFlag::NotForValidateSig => [0x00, 0x02],
        }
    }
}

/// Encodings every policy provides
pub trait PolicyParams {
    /// Short policy name used in error context
    fn name(&self) -> &'static str;

    fn flag(&self) -> PolicyFlag;

    /// Policy evaluator contract
    fn evaluator(&self) -> Address;

    /// ABI-encoded evaluator parameters
    fn data(&self) -> Bytes;

    /// Check every field against its valid domain
    fn validate(&self) -> Result<()>;

    /// Flag followed by the evaluator address (22 bytes)
    fn descriptor(&self) -> Bytes {
        let mut out = Vec::with_capacity(22);
        out.extend_from_slice(&self.flag().to_bytes());
        out.extend_from_slice(self.evaluator().as_slice());
        out.into()
    }
}

/// Policy that places no restriction beyond the signer itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SudoPolicy {
    #[serde(default)]
    pub flag: PolicyFlag,
    pub evaluator: Address,
}

impl Default for SudoPolicy {
    fn default() -> Self {
        Self {
            flag: PolicyFlag::ForAllValidation,
            evaluator: SUDO_POLICY_CONTRACT,
        }
    }
}

impl PolicyParams for SudoPolicy {
    fn name(&self) -> &'static str {
        "sudo"
    }

    fn flag(&self) -> PolicyFlag {
        self.flag
    }

    fn evaluator(&self) -> Address {
        self.evaluator
    }

    fn data(&self) -> Bytes {
        Bytes::new()
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Closed set of supported policies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    Gas(GasPolicy),
    Sudo(SudoPolicy),
    Timestamp(TimestampPolicy),
    RateLimit(RateLimitPolicy),
}

impl Policy {
    fn inner(&self) -> &dyn PolicyParams {
        match self {
            Policy::Gas(policy) => policy,
            Policy::Sudo(policy) => policy,
            Policy::Timestamp(policy) => policy,
            Policy::RateLimit(policy) => policy,
        }
    }
}

impl PolicyParams for Policy {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn flag(&self) -> PolicyFlag {
        self.inner().flag()
    }

    fn evaluator(&self) -> Address {
        self.inner().evaluator()
    }

    fn data(&self) -> Bytes {
        self.inner().data()
    }

    fn validate(&self) -> Result<()> {
        self.inner().validate()
    }
}

impl From<GasPolicy> for Policy {
    fn from(policy: GasPolicy) -> Self {
        Policy::Gas(policy)
    }
}

impl From<SudoPolicy> for Policy {
    fn from(policy: SudoPolicy) -> Self {
        Policy::Sudo(policy)
    }
}

impl From<TimestampPolicy> for Policy {
    fn from(policy: TimestampPolicy) -> Self {
        Policy::Timestamp(policy)
    }
}

impl From<RateLimitPolicy> for Policy {
    fn from(policy: RateLimitPolicy) -> Self {
        Policy::RateLimit(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_descriptor_layout() {
        let policy = Policy::from(SudoPolicy::default());
        let descriptor = policy.descriptor();
        assert_eq!(descriptor.len(), 22);
        assert_eq!(&descriptor[..2], &[0x00, 0x00]);
        assert_eq!(&descriptor[2..], SUDO_POLICY_CONTRACT.as_slice());
    }

    #[test]
    fn test_flag_bytes() {
        assert_eq!(PolicyFlag::NotForValidateUserOp.to_bytes(), [0x00, 0x01]);
        assert_eq!(PolicyFlag::NotForValidateSig.to_bytes(), [0x00, 0x02]);
    }

    #[test]
    fn test_policy_serde_is_tagged() {
        let policy = Policy::from(GasPolicy::new(U256::from(100_000u64)).unwrap());
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["kind"], "gas");

        let back: Policy = serde_json::from_value(json).unwrap();
        assert_eq!(back, policy);
        assert_eq!(back.data(), policy.data());
    }
}
