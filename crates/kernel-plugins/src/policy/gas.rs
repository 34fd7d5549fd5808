//! Gas spending limit

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use super::{PolicyFlag, PolicyParams, GAS_POLICY_CONTRACT};
use crate::error::{KernelError, Result};

/// Caps the total gas a session may spend, optionally pinning a paymaster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPolicy {
    /// Spend cap in wei (`uint128` on-chain)
    pub max_gas_allowed_in_wei: U256,
    pub enforce_paymaster: bool,
    pub paymaster: Address,
    #[serde(default)]
    pub flag: PolicyFlag,
    pub evaluator: Address,
}

impl GasPolicy {
    pub fn new(max_gas_allowed_in_wei: U256) -> Result<Self> {
        let policy = Self {
            max_gas_allowed_in_wei,
            enforce_paymaster: false,
            paymaster: Address::ZERO,
            flag: PolicyFlag::ForAllValidation,
            evaluator: GAS_POLICY_CONTRACT,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Require every operation to be sponsored by `paymaster`
    pub fn with_paymaster(mut self, paymaster: Address) -> Result<Self> {
        self.enforce_paymaster = true;
        self.paymaster = paymaster;
        self.validate()?;
        Ok(self)
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

impl PolicyParams for GasPolicy {
    fn name(&self) -> &'static str {
        "gas"
    }

    fn flag(&self) -> PolicyFlag {
        self.flag
    }

    fn evaluator(&self) -> Address {
        self.evaluator
    }

    fn data(&self) -> Bytes {
        // uint128 on-chain; validate() keeps the value in range
        (self.max_gas_allowed_in_wei, self.enforce_paymaster, self.paymaster)
            .abi_encode_params()
            .into()
    }

    fn validate(&self) -> Result<()> {
        if self.max_gas_allowed_in_wei.is_zero() {
            return Err(KernelError::invalid_policy(
                self.name(),
                "max_gas_allowed_in_wei must be positive",
            ));
        }
        if self.max_gas_allowed_in_wei > U256::from(u128::MAX) {
            return Err(KernelError::invalid_policy(
                self.name(),
                format!("max_gas_allowed_in_wei {} exceeds uint128", self.max_gas_allowed_in_wei),
            ));
        }
        if self.enforce_paymaster && self.paymaster == Address::ZERO {
            return Err(KernelError::invalid_policy(
                self.name(),
                "enforce_paymaster requires a paymaster address",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_policy_data_is_deterministic() {
        let a = GasPolicy::new(U256::from(100_000u64)).unwrap();
        let b = GasPolicy::new(U256::from(100_000u64)).unwrap();
        assert_eq!(a.data(), b.data());
        assert_eq!(a.data().len(), 96);
        assert_eq!(
            U256::from_be_slice(&a.data()[..32]),
            U256::from(100_000u64)
        );
    }

    #[test]
    fn test_gas_policy_rejects_out_of_domain_limit() {
        let too_large = U256::from(u128::MAX) + U256::from(1u64);
        let err = GasPolicy::new(too_large).unwrap_err();
        assert!(matches!(err, KernelError::InvalidPolicyParams { ref policy, .. } if policy == "gas"));

        assert!(GasPolicy::new(U256::ZERO).is_err());
        assert!(GasPolicy::new(U256::from(u128::MAX)).is_ok());
    }

    #[test]
    fn test_paymaster_enforcement() {
        let base = GasPolicy::new(U256::from(1u64)).unwrap();
        assert!(base.clone().with_paymaster(Address::ZERO).is_err());

        let paymaster = Address::repeat_byte(0x77);
        let pinned = base.with_paymaster(paymaster).unwrap();
        let data = pinned.data();
        assert_eq!(data[63], 1);
        assert_eq!(&data[76..96], paymaster.as_slice());
    }
}
