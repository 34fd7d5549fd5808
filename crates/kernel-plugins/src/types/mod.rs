//! Core value types shared by validators, the plugin manager and the account

pub mod operation;
pub mod version;

pub use operation::{Action, CallType, Execution, Operation};
pub use version::KernelVersion;
