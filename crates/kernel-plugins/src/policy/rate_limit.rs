//! Call rate limit

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use super::{PolicyFlag, PolicyParams, MAX_UINT48, RATE_LIMIT_POLICY_CONTRACT};
use crate::error::{KernelError, Result};

/// Allows at most `count` operations per `interval` seconds, starting at `start_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub interval: u64,
    pub count: u64,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub flag: PolicyFlag,
    pub evaluator: Address,
}

impl RateLimitPolicy {
    pub fn new(interval: u64, count: u64) -> Result<Self> {
        Self::starting_at(interval, count, 0)
    }

    pub fn starting_at(interval: u64, count: u64, start_at: u64) -> Result<Self> {
        let policy = Self {
            interval,
            count,
            start_at,
            flag: PolicyFlag::ForAllValidation,
            evaluator: RATE_LIMIT_POLICY_CONTRACT,
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

impl PolicyParams for RateLimitPolicy {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn flag(&self) -> PolicyFlag {
        self.flag
    }

    fn evaluator(&self) -> Address {
        self.evaluator
    }

    fn data(&self) -> Bytes {
        (self.interval, self.count, self.start_at)
            .abi_encode_params()
            .into()
    }

    fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(KernelError::invalid_policy(self.name(), "count must be positive"));
        }
        if self.interval == 0 {
            return Err(KernelError::invalid_policy(self.name(), "interval must be positive"));
        }
        if [self.interval, self.count, self.start_at]
            .iter()
            .any(|value| *value > MAX_UINT48)
        {
            return Err(KernelError::invalid_policy(
                self.name(),
                "interval, count and start_at must fit in uint48",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_validation() {
        assert!(RateLimitPolicy::new(60, 10).is_ok());
        assert!(RateLimitPolicy::new(60, 0).is_err());
        assert!(RateLimitPolicy::new(0, 10).is_err());
        assert!(RateLimitPolicy::starting_at(60, 10, MAX_UINT48 + 1).is_err());
    }

    #[test]
    fn test_rate_limit_encoding() {
        let policy = RateLimitPolicy::starting_at(60, 10, 5).unwrap();
        let data = policy.data();
        assert_eq!(data.len(), 96);
        assert_eq!(data[31], 60);
        assert_eq!(data[63], 10);
        assert_eq!(data[95], 5);
    }
}
