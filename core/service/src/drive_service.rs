//! The four agent-callable Google Drive operations.

use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, error};

use driveagent_common::{Result, Secret};
use driveagent_storage::{gdrive, DriveApi, DriveFile, NewFile};

use crate::records::{
    CreateFolderInput, CreateFolderOutput, FileDescriptor, MoveFileInput, MoveFileOutput,
    ReadFileInput, ReadFileOutput, SearchFilesInput, SearchFilesOutput,
};
use crate::registry::{FunctionProvider, FunctionRegistry};

/// Page size used when the caller gives no limit (or zero).
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
/// Name reported for files the provider returns without one.
pub const UNTITLED: &str = "Untitled";
/// Content returned by `readFileContent` on any failure.
pub const READ_ERROR_MESSAGE: &str =
    "Error reading file content. It might be a binary file or require different permissions.";

const SEARCH_FIELDS: &str = "files(id, name, mimeType, webViewLink)";
const CREATE_FIELDS: &str = "id, webViewLink";
const MOVE_FIELDS: &str = "id, parents";
const EXPORT_MIME_TYPE: &str = "text/plain";

/// Turn caller input into a Drive filter expression.
///
/// Input containing `=` or `contains` is assumed to already be a filter
/// and passes through; anything else becomes a name-substring match.
/// Quotes inside plain text are not escaped.
pub fn search_filter(query: &str) -> Cow<'_, str> {
    if query.contains('=') || query.contains("contains") {
        Cow::Borrowed(query)
    } else {
        Cow::Owned(format!("name contains '{}'", query))
    }
}

/// Page size for a caller-supplied limit.
///
/// Fractions are truncated and values past `u32::MAX` saturate. Anything
/// below one (or no limit) means [`DEFAULT_SEARCH_LIMIT`].
pub fn page_size(limit: Option<f64>) -> u32 {
    match limit.map(f64::trunc) {
        Some(limit) if limit >= 1.0 => limit.min(u32::MAX as f64) as u32,
        _ => DEFAULT_SEARCH_LIMIT,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<DriveFile> for FileDescriptor {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id.unwrap_or_default(),
            name: non_empty(file.name).unwrap_or_else(|| UNTITLED.to_string()),
            mime_type: file.mime_type.unwrap_or_default(),
            web_view_link: non_empty(file.web_view_link),
        }
    }
}

/// Google Drive operations exposed to agents.
///
/// Holds a read-only handle to the provider; calls share no other state,
/// so the service can be used from any number of tasks at once. No
/// operation retries, paginates or locks.
#[derive(Clone)]
pub struct DriveService {
    api: Arc<dyn DriveApi>,
}

impl std::fmt::Debug for DriveService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveService").finish_non_exhaustive()
    }
}

impl DriveService {
    /// Create a service authenticated with an OAuth2 refresh token.
    ///
    /// Credentials are not validated here. An invalid refresh token shows
    /// up as a failed (fail-soft) result on the first call.
    ///
    /// # Errors
    /// - The HTTP clients could not be constructed
    pub fn new(client_id: &str, client_secret: Secret, refresh_token: Secret) -> Result<Self> {
        let client = gdrive::connect(client_id, client_secret, refresh_token)?;
        Ok(Self::with_api(Arc::new(client)))
    }

    /// Create a service over any Drive implementation.
    pub fn with_api(api: Arc<dyn DriveApi>) -> Self {
        Self { api }
    }

    /// Search for files.
    ///
    /// Returns an empty list on any failure, so "no matches" and "search
    /// failed" look the same to the caller.
    pub async fn search_files(&self, input: SearchFilesInput) -> SearchFilesOutput {
        match self.try_search_files(&input).await {
            Ok(files) => SearchFilesOutput { files },
            Err(e) => {
                error!(query = %input.query, error = %e, "Error searching files");
                SearchFilesOutput::default()
            }
        }
    }

    async fn try_search_files(&self, input: &SearchFilesInput) -> Result<Vec<FileDescriptor>> {
        let filter = search_filter(&input.query);
        let page_size = page_size(input.limit);

        debug!(filter = %filter, page_size, "Searching files");

        let files = self.api.list_files(&filter, page_size, SEARCH_FIELDS).await?;
        Ok(files.into_iter().map(FileDescriptor::from).collect())
    }

    /// Read a file as text.
    ///
    /// Google Docs are exported as plain text; everything else is
    /// downloaded as-is. Binary formats come back garbled or fail.
    pub async fn read_file_content(&self, input: ReadFileInput) -> ReadFileOutput {
        match self.try_read_file_content(&input.file_id).await {
            Ok(content) => ReadFileOutput {
                content,
                success: true,
            },
            Err(e) => {
                error!(file_id = %input.file_id, error = %e, "Error reading file");
                ReadFileOutput {
                    content: READ_ERROR_MESSAGE.to_string(),
                    success: false,
                }
            }
        }
    }

    async fn try_read_file_content(&self, file_id: &str) -> Result<String> {
        let info = self.api.get_file(file_id, "mimeType").await?;

        let body = if info.is_google_doc() {
            debug!(file_id, "Exporting Google Doc as plain text");
            self.api.export_file(file_id, EXPORT_MIME_TYPE).await?
        } else {
            debug!(file_id, mime_type = ?info.mime_type, "Downloading file content");
            self.api.download_media(file_id).await?
        };

        Ok(body.into_text())
    }

    /// Create a folder, under `parentId` when given, else in the root.
    pub async fn create_folder(&self, input: CreateFolderInput) -> CreateFolderOutput {
        match self.try_create_folder(&input).await {
            Ok(output) => output,
            Err(e) => {
                error!(name = %input.name, error = %e, "Error creating folder");
                CreateFolderOutput::default()
            }
        }
    }

    async fn try_create_folder(&self, input: &CreateFolderInput) -> Result<CreateFolderOutput> {
        let parent_id = input.parent_id.as_deref().filter(|p| !p.is_empty());
        let metadata = NewFile::folder(&input.name, parent_id);

        let created = self.api.create_file(&metadata, CREATE_FIELDS).await?;

        Ok(CreateFolderOutput {
            folder_id: non_empty(created.id),
            web_view_link: non_empty(created.web_view_link),
            success: true,
        })
    }

    /// Move a file into `folderId`, detaching it from all current parents.
    ///
    /// Two provider calls: read the parents, then swap them in one update.
    /// A concurrent change between the two is not detected, and a failure
    /// in the update is not rolled back.
    pub async fn move_file(&self, input: MoveFileInput) -> MoveFileOutput {
        match self.try_move_file(&input).await {
            Ok(()) => MoveFileOutput { success: true },
            Err(e) => {
                error!(
                    file_id = %input.file_id,
                    folder_id = %input.folder_id,
                    error = %e,
                    "Error moving file"
                );
                MoveFileOutput { success: false }
            }
        }
    }

    async fn try_move_file(&self, input: &MoveFileInput) -> Result<()> {
        let file = self.api.get_file(&input.file_id, "parents").await?;
        let previous_parents = file.parents.unwrap_or_default().join(",");

        self.api
            .update_parents(
                &input.file_id,
                &input.folder_id,
                &previous_parents,
                MOVE_FIELDS,
            )
            .await?;

        Ok(())
    }
}

impl FunctionProvider for DriveService {
    fn register_functions(self: Arc<Self>, registry: &mut FunctionRegistry) -> Result<()> {
        let service = Arc::clone(&self);
        registry.register(
            "searchFiles",
            "Search for files in Google Drive.",
            move |input: SearchFilesInput| {
                let service = Arc::clone(&service);
                async move { service.search_files(input).await }
            },
        )?;

        let service = Arc::clone(&self);
        registry.register(
            "readFileContent",
            "Read the text content of a file (Google Docs or plain text) for summarization or analysis.",
            move |input: ReadFileInput| {
                let service = Arc::clone(&service);
                async move { service.read_file_content(input).await }
            },
        )?;

        let service = Arc::clone(&self);
        registry.register(
            "createFolder",
            "Create a new folder in Google Drive.",
            move |input: CreateFolderInput| {
                let service = Arc::clone(&service);
                async move { service.create_folder(input).await }
            },
        )?;

        registry.register(
            "moveFile",
            "Move a file to a different folder.",
            move |input: MoveFileInput| {
                let service = Arc::clone(&self);
                async move { service.move_file(input).await }
            },
        )?;

        Ok(())
    }
}
