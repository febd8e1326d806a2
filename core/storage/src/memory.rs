//! In-memory Drive for testing.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use driveagent_common::{Error, Result};

use crate::api::{DriveApi, DriveFile, MediaBody, NewFile};

/// A call received by [`MemoryDrive`], with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveCall {
    List {
        query: String,
        page_size: u32,
        fields: String,
    },
    Get {
        file_id: String,
        fields: String,
    },
    Export {
        file_id: String,
        mime_type: String,
    },
    Media {
        file_id: String,
    },
    Create {
        metadata: NewFile,
        fields: String,
    },
    UpdateParents {
        file_id: String,
        add_parents: String,
        remove_parents: String,
        fields: String,
    },
}

type CallFilter = Box<dyn Fn(&DriveCall) -> bool + Send + Sync>;

struct Failure {
    message: String,
    applies_to: CallFilter,
}

#[derive(Debug, Clone)]
struct Entry {
    file: DriveFile,
    body: MediaBody,
}

/// In-memory Drive implementation.
///
/// Keeps files in insertion order, records every call it receives and can
/// be switched into a failing mode, for every call or only for calls
/// matching a filter, to exercise error paths. Field masks
/// are recorded but not applied: every response carries all stored fields.
#[derive(Default)]
pub struct MemoryDrive {
    entries: Mutex<Vec<Entry>>,
    calls: Mutex<Vec<DriveCall>>,
    failure: Mutex<Option<Failure>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryDrive {
    /// Create an empty drive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given content.
    pub fn insert(&self, file: DriveFile, body: MediaBody) {
        lock(&self.entries).push(Entry { file, body });
    }

    /// Builder-style [`MemoryDrive::insert`].
    pub fn with_file(self, file: DriveFile, body: MediaBody) -> Self {
        self.insert(file, body);
        self
    }

    /// Make every subsequent call fail with a network error.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.fail_on(message, |_| true);
    }

    /// Make subsequent calls matching `applies_to` fail with a network
    /// error. Other calls keep succeeding.
    pub fn fail_on<F>(&self, message: impl Into<String>, applies_to: F)
    where
        F: Fn(&DriveCall) -> bool + Send + Sync + 'static,
    {
        *lock(&self.failure) = Some(Failure {
            message: message.into(),
            applies_to: Box::new(applies_to),
        });
    }

    /// Stop failing calls.
    pub fn recover(&self) {
        *lock(&self.failure) = None;
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<DriveCall> {
        lock(&self.calls).clone()
    }

    /// Current state of a stored file.
    pub fn file(&self, file_id: &str) -> Option<DriveFile> {
        lock(&self.entries)
            .iter()
            .find(|e| e.file.id.as_deref() == Some(file_id))
            .map(|e| e.file.clone())
    }

    /// Record a call, then fail if an armed failure applies to it.
    fn record(&self, call: DriveCall) -> Result<()> {
        let failed = match lock(&self.failure).as_ref() {
            Some(failure) if (failure.applies_to)(&call) => Some(failure.message.clone()),
            _ => None,
        };
        lock(&self.calls).push(call);
        match failed {
            Some(message) => Err(Error::Network(message)),
            None => Ok(()),
        }
    }

    fn find(&self, file_id: &str) -> Result<Entry> {
        lock(&self.entries)
            .iter()
            .find(|e| e.file.id.as_deref() == Some(file_id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", file_id)))
    }
}

/// Extract `x` from a `name contains 'x'` filter.
fn name_filter(query: &str) -> Option<&str> {
    query
        .strip_prefix("name contains '")
        .and_then(|rest| rest.strip_suffix('\''))
}

#[async_trait]
impl DriveApi for MemoryDrive {
    async fn list_files(
        &self,
        query: &str,
        page_size: u32,
        fields: &str,
    ) -> Result<Vec<DriveFile>> {
        self.record(DriveCall::List {
            query: query.to_string(),
            page_size,
            fields: fields.to_string(),
        })?;

        let needle = name_filter(query);
        let files = lock(&self.entries)
            .iter()
            .filter(|e| match needle {
                Some(n) => e.file.name.as_deref().is_some_and(|name| name.contains(n)),
                None => true,
            })
            .take(page_size as usize)
            .map(|e| e.file.clone())
            .collect();

        Ok(files)
    }

    async fn get_file(&self, file_id: &str, fields: &str) -> Result<DriveFile> {
        self.record(DriveCall::Get {
            file_id: file_id.to_string(),
            fields: fields.to_string(),
        })?;
        Ok(self.find(file_id)?.file)
    }

    async fn export_file(&self, file_id: &str, mime_type: &str) -> Result<MediaBody> {
        self.record(DriveCall::Export {
            file_id: file_id.to_string(),
            mime_type: mime_type.to_string(),
        })?;

        let entry = self.find(file_id)?;
        if !entry.file.is_google_doc() {
            return Err(Error::InvalidInput(format!(
                "Export only supports Docs Editors files: {}",
                file_id
            )));
        }
        Ok(entry.body)
    }

    async fn download_media(&self, file_id: &str) -> Result<MediaBody> {
        self.record(DriveCall::Media {
            file_id: file_id.to_string(),
        })?;
        Ok(self.find(file_id)?.body)
    }

    async fn create_file(&self, metadata: &NewFile, fields: &str) -> Result<DriveFile> {
        self.record(DriveCall::Create {
            metadata: metadata.clone(),
            fields: fields.to_string(),
        })?;

        let id = Uuid::new_v4().simple().to_string();
        let parents = if metadata.parents.is_empty() {
            vec!["root".to_string()]
        } else {
            metadata.parents.clone()
        };

        let file = DriveFile {
            web_view_link: Some(format!("https://drive.google.com/drive/folders/{}", id)),
            id: Some(id),
            name: Some(metadata.name.clone()),
            mime_type: Some(metadata.mime_type.clone()),
            parents: Some(parents),
        };

        self.insert(file.clone(), MediaBody::Text(String::new()));
        Ok(file)
    }

    async fn update_parents(
        &self,
        file_id: &str,
        add_parents: &str,
        remove_parents: &str,
        fields: &str,
    ) -> Result<DriveFile> {
        self.record(DriveCall::UpdateParents {
            file_id: file_id.to_string(),
            add_parents: add_parents.to_string(),
            remove_parents: remove_parents.to_string(),
            fields: fields.to_string(),
        })?;

        let mut entries = lock(&self.entries);
        let entry = entries
            .iter_mut()
            .find(|e| e.file.id.as_deref() == Some(file_id))
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", file_id)))?;

        let parents = entry.file.parents.get_or_insert_with(Vec::new);
        let removed: Vec<&str> = remove_parents.split(',').filter(|p| !p.is_empty()).collect();
        parents.retain(|p| !removed.contains(&p.as_str()));

        for parent in add_parents.split(',').filter(|p| !p.is_empty()) {
            if !parents.iter().any(|p| p == parent) {
                parents.push(parent.to_string());
            }
        }

        Ok(entry.file.clone())
    }
}
