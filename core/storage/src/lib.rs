//! Provider layer for DriveAgent.
//!
//! This module defines the [`DriveApi`] seam over the Google Drive v3 REST
//! API, the reqwest-backed [`gdrive::DriveClient`] that implements it, and an
//! in-memory [`MemoryDrive`] used by tests.
//!
//! # Design Principles
//! - One method per provider call: callers compose them, nothing here retries
//! - Field masks are passed through verbatim so callers control response shape
//! - Unified error semantics: HTTP status codes map onto the common `Error`

pub mod api;
pub mod gdrive;
pub mod memory;

pub use api::{DriveApi, DriveFile, MediaBody, NewFile, FOLDER_MIME_TYPE, GOOGLE_DOC_MIME_TYPE};
pub use memory::{DriveCall, MemoryDrive};
