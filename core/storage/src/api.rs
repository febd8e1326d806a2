//! Google Drive API seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use driveagent_common::Result;

/// MIME type of a Drive folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
/// MIME type of a native Google Docs document.
pub const GOOGLE_DOC_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// File resource as returned by the Drive API.
///
/// Every field is optional because requests use partial field masks
/// (`fields=mimeType`, `fields=parents`, ...) and the provider omits what
/// was not asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<String>>,
}

impl DriveFile {
    /// Check if this is a native Google Docs document.
    pub fn is_google_doc(&self) -> bool {
        self.mime_type.as_deref() == Some(GOOGLE_DOC_MIME_TYPE)
    }
}

/// Request body for creating a file resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    /// Omitted from the request when empty, which places the file in the
    /// user's root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl NewFile {
    /// Metadata for a folder, optionally under a single parent.
    pub fn folder(name: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            name: name.into(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            parents: parent_id.map(|p| vec![p.to_string()]).unwrap_or_default(),
        }
    }
}

/// Response body of an export or media download.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaBody {
    /// Body decoded as UTF-8 text.
    Text(String),
    /// Body the provider declared as `application/json` and that parsed.
    Json(serde_json::Value),
    /// Body that is not valid UTF-8.
    Bytes(Vec<u8>),
}

impl MediaBody {
    /// Classify a raw response body using its declared content type.
    pub fn from_response(content_type: Option<&str>, body: Vec<u8>) -> Self {
        let is_json = content_type
            .map(|ct| ct.split(';').next().unwrap_or("").trim())
            .is_some_and(|ct| ct.eq_ignore_ascii_case("application/json"));

        if is_json {
            if let Ok(value) = serde_json::from_slice(&body) {
                return MediaBody::Json(value);
            }
        }

        match String::from_utf8(body) {
            Ok(text) => MediaBody::Text(text),
            Err(e) => MediaBody::Bytes(e.into_bytes()),
        }
    }

    /// Flatten the body into a string.
    ///
    /// Text passes through, JSON is re-serialized compactly and raw bytes
    /// are decoded lossily.
    pub fn into_text(self) -> String {
        match self {
            MediaBody::Text(text) => text,
            MediaBody::Json(value) => value.to_string(),
            MediaBody::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Google Drive operations used by the agent.
///
/// Each method is one provider round trip. Implementations must be safe
/// for concurrent use.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// List files matching a filter expression (`files.list`).
    ///
    /// Returns a single page of at most `page_size` files.
    async fn list_files(&self, query: &str, page_size: u32, fields: &str)
        -> Result<Vec<DriveFile>>;

    /// Get file metadata (`files.get`).
    ///
    /// # Errors
    /// - File not found
    /// - Authentication or permission errors
    async fn get_file(&self, file_id: &str, fields: &str) -> Result<DriveFile>;

    /// Export a native document to the given MIME type (`files.export`).
    async fn export_file(&self, file_id: &str, mime_type: &str) -> Result<MediaBody>;

    /// Download raw file content (`files.get` with `alt=media`).
    async fn download_media(&self, file_id: &str) -> Result<MediaBody>;

    /// Create a file resource from metadata only (`files.create`).
    async fn create_file(&self, metadata: &NewFile, fields: &str) -> Result<DriveFile>;

    /// Change a file's parents (`files.update`).
    ///
    /// `add_parents` and `remove_parents` are comma-separated folder IDs.
    /// An empty `remove_parents` removes nothing.
    async fn update_parents(
        &self,
        file_id: &str,
        add_parents: &str,
        remove_parents: &str,
        fields: &str,
    ) -> Result<DriveFile>;
}
