//! MCP transport for DriveAgent.
//!
//! Serves a [`Session`]'s function registry as MCP tools: one tool per
//! registered function, with the function's input and output schemas.

use std::sync::Arc;

use driveagent_common::Error;
use driveagent_service::{FunctionSpec, Session};
use rmcp::{
    model::*,
    service::{RequestContext, RoleServer},
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde_json::Value;

/// MCP server exposing a DriveAgent session.
#[derive(Clone)]
pub struct DriveAgentServer {
    session: Arc<Session>,
}

impl std::fmt::Debug for DriveAgentServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveAgentServer")
            .field("service", &self.session.service_name())
            .finish_non_exhaustive()
    }
}

fn schema_object(schema: &Value) -> Arc<JsonObject> {
    match schema {
        Value::Object(map) => Arc::new(map.clone()),
        _ => Arc::new(JsonObject::new()),
    }
}

/// Describe a registered function as an MCP tool.
pub fn tool_for(spec: &FunctionSpec) -> Tool {
    Tool {
        name: spec.name.clone().into(),
        title: None,
        description: Some(spec.description.clone().into()),
        input_schema: schema_object(&spec.input_schema),
        output_schema: Some(schema_object(&spec.output_schema)),
        annotations: None,
        icons: None,
        meta: None,
    }
}

impl DriveAgentServer {
    /// Wrap a built session.
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    /// All tools this server advertises.
    pub fn tools(&self) -> Vec<Tool> {
        self.session
            .registry()
            .functions()
            .iter()
            .map(tool_for)
            .collect()
    }

    /// Run a tool by name.
    ///
    /// Missing arguments are treated as an empty object.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let args = Value::Object(arguments.unwrap_or_default());

        match self.session.registry().call(name, args).await {
            Ok(value) => Ok(CallToolResult::structured(value)),
            Err(Error::NotFound(_)) => Err(McpError::invalid_params(
                format!("Unknown tool: {}", name),
                None,
            )),
            Err(Error::InvalidInput(msg)) => Err(McpError::invalid_params(msg, None)),
            Err(e) => Err(McpError::internal_error(e.to_string(), None)),
        }
    }

    /// Serve over stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> driveagent_common::Result<()> {
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .inspect_err(|e| tracing::error!("Failed to start MCP service: {}", e))
            .map_err(|e| Error::Network(format!("Failed to start MCP service: {}", e)))?;

        tracing::info!("MCP server running on stdio");

        service
            .waiting()
            .await
            .map_err(|e| Error::Network(format!("MCP service task failed: {}", e)))?;

        tracing::info!("MCP server shutting down");
        Ok(())
    }
}

impl ServerHandler for DriveAgentServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(format!(
                "{} works with the user's Google Drive. Use 'searchFiles' to find files, \
                'readFileContent' to read a file's text, 'createFolder' to create folders \
                and 'moveFile' to move a file into a folder.",
                self.session.service_name()
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(request.name.as_ref(), request.arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driveagent_service::{DriveService, ServiceBuilder};
    use driveagent_storage::{DriveFile, MediaBody, MemoryDrive, GOOGLE_DOC_MIME_TYPE};
    use serde_json::json;

    fn server(drive: MemoryDrive) -> DriveAgentServer {
        let service = Arc::new(DriveService::with_api(Arc::new(drive)));
        let session = ServiceBuilder::new()
            .with_service_name("GoogleDriveKnowledgeAgent")
            .register_service(service)
            .build()
            .unwrap();
        DriveAgentServer::new(session)
    }

    fn args(value: Value) -> Option<JsonObject> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    #[test]
    fn test_tools_mirror_registry() {
        let tools = server(MemoryDrive::new()).tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(
            names,
            vec!["searchFiles", "readFileContent", "createFolder", "moveFile"]
        );

        let search = &tools[0];
        assert_eq!(
            search.description.as_deref(),
            Some("Search for files in Google Drive.")
        );
        assert!(search.input_schema.contains_key("properties"));
        assert!(search.output_schema.is_some());
    }

    #[test]
    fn test_schema_object_fallback() {
        assert!(schema_object(&Value::Null).is_empty());
        assert_eq!(schema_object(&json!({"type": "object"})).len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_read() {
        let drive = MemoryDrive::new().with_file(
            DriveFile {
                id: Some("doc".to_string()),
                name: Some("Notes".to_string()),
                mime_type: Some(GOOGLE_DOC_MIME_TYPE.to_string()),
                ..Default::default()
            },
            MediaBody::Text("hello".to_string()),
        );

        let result = server(drive)
            .dispatch("readFileContent", args(json!({"fileId": "doc"})))
            .await
            .unwrap();

        assert_eq!(
            result.structured_content,
            Some(json!({"content": "hello", "success": true}))
        );
    }

    #[tokio::test]
    async fn test_dispatch_errors() {
        let server = server(MemoryDrive::new());

        assert!(server.dispatch("deleteEverything", None).await.is_err());
        assert!(server.dispatch("moveFile", None).await.is_err());
        assert!(server
            .dispatch("searchFiles", args(json!({"query": 7})))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_dispatch_provider_failure_is_not_an_error() {
        let drive = MemoryDrive::new();
        drive.fail_with("timeout");

        let result = server(drive)
            .dispatch("createFolder", args(json!({"name": "Reports"})))
            .await
            .unwrap();

        assert_eq!(result.structured_content, Some(json!({"success": false})));
    }
}
