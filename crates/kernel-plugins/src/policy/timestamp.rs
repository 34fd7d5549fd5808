//! Validity window

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use super::{PolicyFlag, PolicyParams, MAX_UINT48, TIMESTAMP_POLICY_CONTRACT};
use crate::error::{KernelError, Result};

/// Restricts use to `[valid_after, valid_until]`, in unix seconds
///
/// `valid_until == 0` leaves the window open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampPolicy {
    pub valid_after: u64,
    pub valid_until: u64,
    #[serde(default)]
    pub flag: PolicyFlag,
    pub evaluator: Address,
}

impl TimestampPolicy {
    pub fn new(valid_after: u64, valid_until: u64) -> Result<Self> {
        let policy = Self {
            valid_after,
            valid_until,
            flag: PolicyFlag::ForAllValidation,
            evaluator: TIMESTAMP_POLICY_CONTRACT,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn with_flag(mut self, flag: PolicyFlag) -> Self {
        self.flag = flag;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Address) -> Self {
        self.evaluator = evaluator;
        self
    }
}

impl PolicyParams for TimestampPolicy {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn flag(&self) -> PolicyFlag {
        self.flag
    }

    fn evaluator(&self) -> Address {
        self.evaluator
    }

    fn data(&self) -> Bytes {
        (self.valid_after, self.valid_until).abi_encode_params().into()
    }

    fn validate(&self) -> Result<()> {
        if self.valid_after > MAX_UINT48 || self.valid_until > MAX_UINT48 {
            return Err(KernelError::invalid_policy(
                self.name(),
                "timestamps must fit in uint48",
            ));
        }
        if self.valid_until != 0 && self.valid_until <= self.valid_after {
            return Err(KernelError::invalid_policy(
                self.name(),
                format!(
                    "valid_until {} must be after valid_after {}",
                    self.valid_until, self.valid_after
                ),
            ));
        }
        Ok(())
    }
}
