//! Common utilities and types shared across DriveAgent crates.
//!
//! This module provides the error type used by every layer and the
//! [`Secret`] wrapper for credentials read from the environment.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::Secret;
