//! Utility functions and helpers.

pub mod redact;

// Re-export commonly used functions
pub use redact::redact_secrets;
