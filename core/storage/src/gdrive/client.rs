//! Google Drive API client.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;

use driveagent_common::{Error, Result};

use super::auth::TokenManager;
use crate::api::{DriveApi, DriveFile, MediaBody, NewFile};

/// Google Drive API base URL.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Bytes escaped in a file id used as a URL path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Response from listing files.
#[derive(Debug, serde::Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Google Drive API client.
pub struct DriveClient {
    http: Client,
    token_manager: Arc<TokenManager>,
    base_url: String,
}

impl DriveClient {
    /// Create a new Drive client against the public API.
    pub fn new(token_manager: Arc<TokenManager>) -> Result<Self> {
        Self::with_base_url(token_manager, DRIVE_API_BASE)
    }

    /// Create a Drive client against a custom API root.
    pub fn with_base_url(
        token_manager: Arc<TokenManager>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("DriveAgent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            token_manager,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get authorization header.
    async fn auth_header(&self) -> Result<String> {
        let token = self.token_manager.get_access_token().await?;
        Ok(format!("Bearer {}", token))
    }

    fn file_url(&self, file_id: &str) -> String {
        format!(
            "{}/files/{}",
            self.base_url,
            utf8_percent_encode(file_id, PATH_SEGMENT)
        )
    }

    /// Read a media or export response body.
    async fn read_body(&self, response: reqwest::Response) -> Result<MediaBody> {
        let response = check_status(response).await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        Ok(MediaBody::from_response(content_type.as_deref(), body.to_vec()))
    }

    /// Handle API response with error checking.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))
    }
}

/// Map non-success statuses onto the common error type.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

fn status_error(status: StatusCode, body: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound("Resource not found".to_string()),
        StatusCode::UNAUTHORIZED => Error::Authentication("Invalid or expired token".to_string()),
        StatusCode::FORBIDDEN => Error::PermissionDenied("Access denied".to_string()),
        _ => Error::Network(format!("API error: {} - {}", status, body)),
    }
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn list_files(
        &self,
        query: &str,
        page_size: u32,
        fields: &str,
    ) -> Result<Vec<DriveFile>> {
        let url = format!("{}/files", self.base_url);
        let auth = self.auth_header().await?;
        let page_size = page_size.to_string();

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .query(&[
                ("q", query),
                ("pageSize", page_size.as_str()),
                ("fields", fields),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to list files: {}", e)))?;

        let list_response: FileListResponse = self.handle_response(response).await?;
        Ok(list_response.files)
    }

    async fn get_file(&self, file_id: &str, fields: &str) -> Result<DriveFile> {
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(self.file_url(file_id))
            .header(header::AUTHORIZATION, auth)
            .query(&[("fields", fields)])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to get file: {}", e)))?;

        self.handle_response(response).await
    }

    async fn export_file(&self, file_id: &str, mime_type: &str) -> Result<MediaBody> {
        let url = format!("{}/export", self.file_url(file_id));
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .query(&[("mimeType", mime_type)])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to export file: {}", e)))?;

        self.read_body(response).await
    }

    async fn download_media(&self, file_id: &str) -> Result<MediaBody> {
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(self.file_url(file_id))
            .header(header::AUTHORIZATION, auth)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to download file: {}", e)))?;

        self.read_body(response).await
    }

    async fn create_file(&self, metadata: &NewFile, fields: &str) -> Result<DriveFile> {
        let url = format!("{}/files", self.base_url);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, auth)
            .query(&[("fields", fields)])
            .json(metadata)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to create file: {}", e)))?;

        self.handle_response(response).await
    }

    async fn update_parents(
        &self,
        file_id: &str,
        add_parents: &str,
        remove_parents: &str,
        fields: &str,
    ) -> Result<DriveFile> {
        let auth = self.auth_header().await?;

        let mut request = self
            .http
            .patch(self.file_url(file_id))
            .header(header::AUTHORIZATION, auth)
            .query(&[("addParents", add_parents), ("fields", fields)]);

        if !remove_parents.is_empty() {
            request = request.query(&[("removeParents", remove_parents)]);
        }

        let response = request
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to update file parents: {}", e)))?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdrive::auth::{AuthConfig, AuthManager, Tokens};
    use driveagent_common::Secret;

    fn token_manager() -> Arc<TokenManager> {
        let auth = AuthManager::new(AuthConfig::new("id", Secret::new("secret"))).unwrap();
        Arc::new(TokenManager::new(
            auth,
            Tokens::from_refresh_token(Secret::new("refresh")),
        ))
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, String::new()),
            Error::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            Error::Authentication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            Error::PermissionDenied(_)
        ));

        let err = status_error(StatusCode::BAD_REQUEST, "Invalid Value".to_string());
        match err {
            Error::Network(msg) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("Invalid Value"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = DriveClient::with_base_url(token_manager(), "http://localhost:1/drive/v3/")
            .unwrap();
        assert_eq!(client.file_url("abc"), "http://localhost:1/drive/v3/files/abc");

        let client = DriveClient::new(token_manager()).unwrap();
        assert_eq!(
            client.file_url("abc"),
            "https://www.googleapis.com/drive/v3/files/abc"
        );
    }

    #[test]
    fn test_file_url_escapes_id() {
        let client = DriveClient::new(token_manager()).unwrap();
        assert_eq!(
            client.file_url("1a-B_c.d~"),
            format!("{}/files/1a-B_c.d~", DRIVE_API_BASE)
        );
        assert_eq!(
            client.file_url("a/b?c#d e"),
            format!("{}/files/a%2Fb%3Fc%23d%20e", DRIVE_API_BASE)
        );
        assert_eq!(
            client.file_url("../about"),
            format!("{}/files/..%2Fabout", DRIVE_API_BASE)
        );
    }

    #[test]
    fn test_file_list_response_without_files() {
        let list: FileListResponse = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }
}
