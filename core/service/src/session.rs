//! Assembling services into a servable session.

use std::sync::Arc;

use driveagent_common::{Error, Result};

use crate::registry::{FunctionProvider, FunctionRegistry};

/// A named registry ready to be served by a transport.
#[derive(Debug)]
pub struct Session {
    service_name: String,
    registry: FunctionRegistry,
}

impl Session {
    /// Name the session is advertised under.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Functions callable in this session.
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }
}

/// Builder collecting services into a [`Session`].
///
/// Registration errors are kept and reported by [`ServiceBuilder::build`]
/// so calls can be chained.
#[derive(Debug, Default)]
pub struct ServiceBuilder {
    service_name: Option<String>,
    registry: FunctionRegistry,
    error: Option<Error>,
}

impl ServiceBuilder {
    /// Create a builder with no services.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the advertised service name.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Register every function a service exposes.
    pub fn register_service<S: FunctionProvider>(mut self, service: Arc<S>) -> Self {
        if self.error.is_none() {
            if let Err(e) = service.register_functions(&mut self.registry) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Finish the session.
    ///
    /// # Errors
    /// - A service failed to register (e.g. duplicate function name)
    /// - No service name was set
    pub fn build(self) -> Result<Session> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let service_name = self
            .service_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("Service name is required".to_string()))?;

        tracing::info!(
            service = %service_name,
            functions = ?self.registry.names(),
            "Session built"
        );

        Ok(Session {
            service_name,
            registry: self.registry,
        })
    }
}
