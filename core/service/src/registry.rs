//! Function registry for agent-callable operations.
//!
//! Each entry binds a name to a description, JSON Schemas for its input and
//! output, and a type-erased handler. Input validation is deserialization
//! into the handler's typed input; output validation is the handler's
//! typed return value.

use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use driveagent_common::{Error, Result};

/// Type-erased handler: JSON arguments in, JSON result out.
pub type FunctionHandler = Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Public description of a registered function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

struct RegisteredFunction {
    spec: FunctionSpec,
    handler: FunctionHandler,
}

/// Registry of callable functions, kept in registration order.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: Vec<RegisteredFunction>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default()
}

impl FunctionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed function.
    ///
    /// # Preconditions
    /// - `name` must be unique within the registry
    ///
    /// # Postconditions
    /// - The function is listed by [`FunctionRegistry::functions`] and
    ///   callable through [`FunctionRegistry::call`]
    ///
    /// # Errors
    /// - Returns error if name is already registered
    pub fn register<I, O, F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<()>
    where
        I: DeserializeOwned + JsonSchema + 'static,
        O: Serialize + JsonSchema + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let name = name.into();
        if self.has_function(&name) {
            return Err(Error::AlreadyExists(format!(
                "Function '{}' is already registered",
                name
            )));
        }

        let spec = FunctionSpec {
            name: name.clone(),
            description: description.into(),
            input_schema: schema_of::<I>(),
            output_schema: schema_of::<O>(),
        };

        let handler: FunctionHandler = Box::new(move |args: Value| {
            let pending = serde_json::from_value::<I>(args)
                .map_err(|e| {
                    Error::InvalidInput(format!("Invalid arguments for '{}': {}", name, e))
                })
                .map(&handler);

            Box::pin(async move {
                let output = pending?.await;
                serde_json::to_value(output)
                    .map_err(|e| Error::Serialization(format!("Failed to encode result: {}", e)))
            })
        });

        self.functions.push(RegisteredFunction { spec, handler });
        Ok(())
    }

    /// Call a function by name with JSON arguments.
    ///
    /// # Errors
    /// - Function not found
    /// - Arguments do not match the function's input schema
    pub async fn call(&self, name: &str, args: Value) -> Result<Value> {
        let function = self
            .functions
            .iter()
            .find(|f| f.spec.name == name)
            .ok_or_else(|| Error::NotFound(format!("Function '{}' is not registered", name)))?;

        tracing::debug!(function = name, "Calling function");
        (function.handler)(args).await
    }

    /// Specs of all registered functions.
    pub fn functions(&self) -> Vec<FunctionSpec> {
        self.functions.iter().map(|f| f.spec.clone()).collect()
    }

    /// Spec of a single function.
    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions
            .iter()
            .map(|f| &f.spec)
            .find(|spec| spec.name == name)
    }

    /// Names of all registered functions.
    pub fn names(&self) -> Vec<&str> {
        self.functions.iter().map(|f| f.spec.name.as_str()).collect()
    }

    /// Check if a function is registered.
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f.spec.name == name)
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// A service that contributes functions to a registry.
pub trait FunctionProvider: Send + Sync + 'static {
    /// Register every function this service exposes.
    fn register_functions(self: Arc<Self>, registry: &mut FunctionRegistry) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct EchoInput {
        text: String,
    }

    #[derive(Serialize, JsonSchema)]
    struct EchoOutput {
        echoed: String,
    }

    fn echo_registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry
            .register("echo", "Echo text back.", |input: EchoInput| async move {
                EchoOutput { echoed: input.text }
            })
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_register_and_call() {
        let registry = echo_registry();

        let result = registry.call("echo", json!({"text": "hi"})).await.unwrap();
        assert_eq!(result, json!({"echoed": "hi"}));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = echo_registry();

        let result = registry.register("echo", "Again.", |input: EchoInput| async move {
            EchoOutput { echoed: input.text }
        });
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_call_unknown_fails() {
        let registry = FunctionRegistry::new();
        let result = registry.call("unknown", json!({})).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected() {
        let registry = echo_registry();

        let result = registry.call("echo", json!({"text": 42})).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = registry.call("echo", json!({})).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_specs_and_schemas() {
        let registry = echo_registry();
        let spec = registry.function("echo").unwrap();

        assert_eq!(spec.description, "Echo text back.");
        assert_eq!(spec.input_schema["type"], json!("object"));
        assert!(spec.input_schema["properties"]["text"].is_object());
        assert!(spec.output_schema["properties"]["echoed"].is_object());
        assert_eq!(registry.names(), vec!["echo"]);
        assert!(registry.has_function("echo"));
        assert!(!registry.is_empty());
    }
}
