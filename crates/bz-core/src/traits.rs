//! # Core Traits (Ports)
//!
//! The collaborators the controller talks to but does not own: persistent
//! client storage, the toast widget and confirmation dialogs.

use crate::error::StoreError;

/// Flat string key/value storage that survives page loads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// Non-blocking notification sink (toasts).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str);
}

/// Confirmation gate for irreversible actions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Dialogs: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}
