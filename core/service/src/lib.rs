//! Google Drive functions for DriveAgent.
//!
//! [`DriveService`] implements the four agent-callable operations on top of
//! a [`driveagent_storage::DriveApi`]. Every operation is fail-soft: provider
//! errors are logged and turned into a fixed, structurally valid result.
//!
//! [`FunctionRegistry`] maps operation names to their JSON schemas and
//! handlers, and [`ServiceBuilder`] assembles registries into a [`Session`]
//! that a transport can serve.

pub mod config;
pub mod drive_service;
pub mod records;
pub mod registry;
pub mod session;

pub use config::AgentConfig;
pub use drive_service::DriveService;
pub use records::*;
pub use registry::{FunctionProvider, FunctionRegistry, FunctionSpec};
pub use session::{ServiceBuilder, Session};
