//! Sudo/regular validator composition and the enable protocol

pub mod enable;
pub mod manager;

pub use enable::{EnablePayload, ValidityWindow, ENABLE_MODE, SUDO_MODE};
pub use manager::{PluginManager, PluginManagerConfig, PluginState, Route};
