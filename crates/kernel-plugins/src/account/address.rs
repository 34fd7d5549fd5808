//! Counterfactual account address and init code

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

use crate::crypto::abi::{CallCodec, IKernel, IKernelFactory, KernelCall};
use crate::error::Result;

const PROXY_PREFIX: [u8; 20] = [
    0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3, 0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d,
    0x3d, 0x36, 0x3d, 0x73,
];

const PROXY_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

/// `initialize(validator, validatorData)` call the factory forwards to the proxy
pub fn initialize_call(
    codec: &dyn CallCodec,
    validator: Address,
    validator_data: Bytes,
) -> Result<Bytes> {
    codec.encode(&KernelCall::Initialize(IKernel::initializeCall {
        validator,
        data: validator_data,
    }))
}

/// `factory ‖ createAccount(implementation, initialize, index)`
pub fn init_code(
    codec: &dyn CallCodec,
    factory: Address,
    implementation: Address,
    initialize: Bytes,
    index: U256,
) -> Result<Bytes> {
    let create = codec.encode(&KernelCall::CreateAccount(IKernelFactory::createAccountCall {
        implementation,
        data: initialize,
        index,
    }))?;

    let mut out = Vec::with_capacity(20 + create.len());
    out.extend_from_slice(factory.as_slice());
    out.extend_from_slice(&create);
    Ok(out.into())
}

/// Salt the factory derives from the initialize call and the account index
pub fn account_salt(initialize: &[u8], index: U256) -> B256 {
    let mut preimage = Vec::with_capacity(initialize.len() + 32);
    preimage.extend_from_slice(initialize);
    preimage.extend_from_slice(&index.to_be_bytes::<32>());
    keccak256(preimage)
}

/// keccak256 of the minimal proxy creation code pointing at `implementation`
pub fn proxy_code_hash(implementation: Address) -> B256 {
    let mut code = Vec::with_capacity(PROXY_PREFIX.len() + 20 + PROXY_SUFFIX.len());
    code.extend_from_slice(&PROXY_PREFIX);
    code.extend_from_slice(implementation.as_slice());
    code.extend_from_slice(&PROXY_SUFFIX);
    keccak256(code)
}

/// CREATE2 address of the account the factory deploys
pub fn counterfactual_address(
    factory: Address,
    implementation: Address,
    initialize: &[u8],
    index: U256,
) -> Address {
    let salt = account_salt(initialize, index);
    let code_hash = proxy_code_hash(implementation);
    factory.create2(&salt.0, &code_hash.0)
}
