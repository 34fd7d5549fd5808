//! Kernel account versions and the validator contracts deployed for them

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// ECDSA validator used by kernel 0.0.2 through 0.2.4
pub const ECDSA_VALIDATOR_V0_2: Address = address!("d9AB5096a832b9ce79914329DAEE236f8Eea0390");

/// ECDSA validator for kernel 0.3.0-beta
pub const ECDSA_VALIDATOR_V0_3_0_BETA: Address =
    address!("8104e3Ad430EA6d354d013A6789fDFc71E671c43");

/// ECDSA validator for kernel 0.3.1
pub const ECDSA_VALIDATOR_V0_3_1: Address = address!("845ADb2C711129d4f3966735eD98a9F09fC4cE57");

/// Deployed kernel account versions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KernelVersion {
    V0_0_2,
    V0_2_2,
    #[default]
    V0_2_3,
    V0_2_4,
    V0_3_0Beta,
    V0_3_1,
}

impl KernelVersion {
    /// Dotted version string, also used as the EIP-712 domain version
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelVersion::V0_0_2 => "0.0.2",
            KernelVersion::V0_2_2 => "0.2.2",
            KernelVersion::V0_2_3 => "0.2.3",
            KernelVersion::V0_2_4 => "0.2.4",
            KernelVersion::V0_3_0Beta => "0.3.0-beta",
            KernelVersion::V0_3_1 => "0.3.1",
        }
    }

    /// ECDSA validator contract deployed for this version
    pub fn ecdsa_validator(&self) -> Address {
        match self {
            KernelVersion::V0_0_2
            | KernelVersion::V0_2_2
            | KernelVersion::V0_2_3
            | KernelVersion::V0_2_4 => ECDSA_VALIDATOR_V0_2,
            KernelVersion::V0_3_0Beta => ECDSA_VALIDATOR_V0_3_0_BETA,
            KernelVersion::V0_3_1 => ECDSA_VALIDATOR_V0_3_1,
        }
    }
}

impl std::fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KernelVersion {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0.0.2" => Ok(KernelVersion::V0_0_2),
            "0.2.2" => Ok(KernelVersion::V0_2_2),
            "0.2.3" => Ok(KernelVersion::V0_2_3),
            "0.2.4" => Ok(KernelVersion::V0_2_4),
            "0.3.0-beta" => Ok(KernelVersion::V0_3_0Beta),
            "0.3.1" => Ok(KernelVersion::V0_3_1),
            other => Err(KernelError::InvalidConfig(format!(
                "unknown kernel version: {other}"
            ))),
        }
    }
}

impl TryFrom<String> for KernelVersion {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KernelVersion> for String {
    fn from(version: KernelVersion) -> Self {
        version.as_str().to_string()
    }
}
