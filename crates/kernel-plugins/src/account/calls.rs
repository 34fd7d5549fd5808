//! Execution call data
//!
//! Shapes the account executor accepts:
//! - `execute(address,uint256,bytes,uint8)` for a single call
//! - `executeDelegateCall(address,bytes)` for a single delegated call
//! - `executeBatch((address,uint256,bytes)[])` for plain-call batches

use alloy_primitives::{address, Address, Bytes, U256};
use tracing::warn;

use crate::crypto::abi::{CallCodec, ICreateCall, IKernel, KernelCall};
use crate::error::{KernelError, Result};
use crate::types::{CallType, Execution, Operation};

/// CreateCall library used to deploy contracts from the account
pub const CREATE_CALL: Address = address!("9b35Af71d77eaf8d7e40252370304687390A1A52");

/// Encode an execution for `account`
pub fn encode_execution(
    codec: &dyn CallCodec,
    account: Address,
    execution: &Execution,
) -> Result<Bytes> {
    match execution {
        Execution::Single(operation) => encode_single(codec, account, operation),
        Execution::Batch(operations) => encode_batch(codec, operations),
    }
}

fn encode_single(codec: &dyn CallCodec, account: Address, operation: &Operation) -> Result<Bytes> {
    match operation.call_type {
        CallType::Call if operation.target == account => {
            if !operation.value.is_zero() {
                warn!(
                    account = %account,
                    value = %operation.value,
                    "Self call is sent as raw call data, its value is not forwarded"
                );
            }
            Ok(operation.data.clone())
        }
        CallType::Call => codec.encode(&KernelCall::Execute(IKernel::executeCall {
            to: operation.target,
            value: operation.value,
            data: operation.data.clone(),
            operation: 0,
        })),
        CallType::Delegatecall => codec.encode(&KernelCall::ExecuteDelegateCall(
            IKernel::executeDelegateCallCall {
                to: operation.target,
                data: operation.data.clone(),
            },
        )),
    }
}

fn encode_batch(codec: &dyn CallCodec, operations: &[Operation]) -> Result<Bytes> {
    if let Some(index) = operations
        .iter()
        .position(|op| op.call_type == CallType::Delegatecall)
    {
        return Err(KernelError::DelegatecallNotBatchable { index });
    }

    let calls = operations
        .iter()
        .map(|op| crate::crypto::abi::Call {
            to: op.target,
            value: op.value,
            data: op.data.clone(),
        })
        .collect();

    codec.encode(&KernelCall::ExecuteBatch(IKernel::executeBatchCall { calls }))
}

/// Delegatecall into the CreateCall library deploying `bytecode`
pub fn encode_deploy(codec: &dyn CallCodec, bytecode: &Bytes) -> Result<Bytes> {
    let create = codec.encode(&KernelCall::PerformCreate(ICreateCall::performCreateCall {
        value: U256::ZERO,
        deploymentData: bytecode.clone(),
    }))?;

    codec.encode(&KernelCall::ExecuteDelegateCall(IKernel::executeDelegateCallCall {
        to: CREATE_CALL,
        data: create,
    }))
}
