//! Contract-call codec
//!
//! The account builder treats call encoding as an external service behind
//! [`CallCodec`]. [`AbiCodec`] is the default implementation over the kernel
//! contract bindings declared here.

use alloy_primitives::{keccak256, Bytes, Selector};
use alloy_sol_types::{sol, SolCall};

use crate::error::{KernelError, Result};

sol! {
    /// One element of an `executeBatch` call
    #[derive(Debug, PartialEq, Eq)]
    struct Call {
        address to;
        uint256 value;
        bytes data;
    }

    /// Sudo approval of a regular validator, signed as EIP-712 typed data
    #[derive(Debug, PartialEq, Eq)]
    struct ValidatorApproved {
        bytes4 sig;
        uint256 validatorData;
        address executor;
        bytes enableData;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IKernel {
        function initialize(address validator, bytes calldata data) external payable;
        function execute(address to, uint256 value, bytes calldata data, uint8 operation) external payable;
        function executeDelegateCall(address to, bytes calldata data) external payable;
        function executeBatch(Call[] calldata calls) external payable;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IKernelFactory {
        function createAccount(address implementation, bytes calldata data, uint256 index)
            external
            payable
            returns (address proxy);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface ICreateCall {
        function performCreate(uint256 value, bytes memory deploymentData)
            external
            returns (address newContract);
    }
}

/// Calls the account layer issues against the kernel contracts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelCall {
    Initialize(IKernel::initializeCall),
    Execute(IKernel::executeCall),
    ExecuteDelegateCall(IKernel::executeDelegateCallCall),
    ExecuteBatch(IKernel::executeBatchCall),
    CreateAccount(IKernelFactory::createAccountCall),
    PerformCreate(ICreateCall::performCreateCall),
}

/// Encode/decode collaborator for contract calls
pub trait CallCodec: Send + Sync {
    fn encode(&self, call: &KernelCall) -> Result<Bytes>;

    fn decode(&self, data: &[u8]) -> Result<KernelCall>;
}

/// Solidity ABI codec
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiCodec;

impl CallCodec for AbiCodec {
    fn encode(&self, call: &KernelCall) -> Result<Bytes> {
        let data = match call {
            KernelCall::Initialize(call) => call.abi_encode(),
            KernelCall::Execute(call) => call.abi_encode(),
            KernelCall::ExecuteDelegateCall(call) => call.abi_encode(),
            KernelCall::ExecuteBatch(call) => call.abi_encode(),
            KernelCall::CreateAccount(call) => call.abi_encode(),
            KernelCall::PerformCreate(call) => call.abi_encode(),
        };
        Ok(data.into())
    }

    fn decode(&self, data: &[u8]) -> Result<KernelCall> {
        let selector = data
            .get(..4)
            .ok_or_else(|| KernelError::Codec("call data shorter than a selector".to_string()))?;

        let call = if selector == IKernel::initializeCall::SELECTOR {
            KernelCall::Initialize(IKernel::initializeCall::abi_decode(data, true)?)
        } else if selector == IKernel::executeCall::SELECTOR {
            KernelCall::Execute(IKernel::executeCall::abi_decode(data, true)?)
        } else if selector == IKernel::executeDelegateCallCall::SELECTOR {
            KernelCall::ExecuteDelegateCall(IKernel::executeDelegateCallCall::abi_decode(data, true)?)
        } else if selector == IKernel::executeBatchCall::SELECTOR {
            KernelCall::ExecuteBatch(IKernel::executeBatchCall::abi_decode(data, true)?)
        } else if selector == IKernelFactory::createAccountCall::SELECTOR {
            KernelCall::CreateAccount(IKernelFactory::createAccountCall::abi_decode(data, true)?)
        } else if selector == ICreateCall::performCreateCall::SELECTOR {
            KernelCall::PerformCreate(ICreateCall::performCreateCall::abi_decode(data, true)?)
        } else {
            return Err(KernelError::Codec(format!(
                "unknown selector 0x{}",
                alloy_primitives::hex::encode(selector)
            )));
        };
        Ok(call)
    }
}

/// Function selector of a canonical signature such as `transfer(address,uint256)`
pub fn selector(signature: &str) -> Selector {
    Selector::from_slice(&keccak256(signature.as_bytes())[..4])
}
