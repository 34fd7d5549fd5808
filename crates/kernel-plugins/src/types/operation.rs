//! Operations awaiting authorization and the actions that scope validators

use alloy_primitives::{hex, Address, Bytes, Selector, U256};
use serde::{Deserialize, Serialize};

/// How the account dispatches a call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    /// Plain call
    #[default]
    Call,
    /// Delegated call, executed in the account's own storage context
    Delegatecall,
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallType::Call => write!(f, "call"),
            CallType::Delegatecall => write!(f, "delegatecall"),
        }
    }
}

/// A requested action on the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Contract the call is dispatched to
    pub target: Address,
    /// Native value forwarded with the call
    pub value: U256,
    /// Call payload (selector followed by arguments)
    pub data: Bytes,
    /// Dispatch kind
    pub call_type: CallType,
}

impl Operation {
    /// Plain call
    pub fn call(target: Address, value: U256, data: impl Into<Bytes>) -> Self {
        Self {
            target,
            value,
            data: data.into(),
            call_type: CallType::Call,
        }
    }

    /// Delegated call, never carries value
    pub fn delegate(target: Address, data: impl Into<Bytes>) -> Self {
        Self {
            target,
            value: U256::ZERO,
            data: data.into(),
            call_type: CallType::Delegatecall,
        }
    }

    /// Function selector of the payload
    ///
    /// Payloads shorter than four bytes are zero-padded, so an empty payload
    /// maps to the zero selector (the receive/fallback path).
    pub fn selector(&self) -> Selector {
        let mut selector = [0u8; 4];
        let len = self.data.len().min(4);
        selector[..len].copy_from_slice(&self.data[..len]);
        Selector::from(selector)
    }
}

/// Call data shapes accepted by the account executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    Single(Operation),
    Batch(Vec<Operation>),
}

impl From<Operation> for Execution {
    fn from(operation: Operation) -> Self {
        Execution::Single(operation)
    }
}

impl From<Vec<Operation>> for Execution {
    fn from(operations: Vec<Operation>) -> Self {
        Execution::Batch(operations)
    }
}

/// Target contract and function selector a regular validator is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Executor contract the action is dispatched to
    pub target: Address,
    /// Function selector the action covers
    pub selector: Selector,
}

impl Action {
    pub fn new(target: Address, selector: Selector) -> Self {
        Self { target, selector }
    }

    /// Whether this action covers the given target and selector
    pub fn matches(&self, target: Address, selector: Selector) -> bool {
        self.target == target && self.selector == selector
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:0x{}", self.target, hex::encode(self.selector))
    }
}
