use crate::error::{CorpusLoadError, QueryError};
use crate::models::{Document, DocumentRecord};
use chrono::Utc;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use walkdir::WalkDir;

/// An immutable, fully loaded corpus. Queries hold an `Arc` to one snapshot
/// for their whole lifetime, so a reload can never tear a query in half.
#[derive(Debug, Default)]
pub struct CorpusSnapshot {
    documents: Vec<Document>,
    by_id: HashMap<String, usize>,
}

impl CorpusSnapshot {
    pub fn from_documents(mut documents: Vec<Document>) -> Self {
        documents.sort_by(|left, right| left.document_id.cmp(&right.document_id));
        documents.dedup_by(|later, earlier| {
            if later.document_id == earlier.document_id {
                warn!(document_id = %later.document_id, "duplicate document id, keeping first");
                true
            } else {
                false
            }
        });

        let by_id = documents
            .iter()
            .enumerate()
            .map(|(index, document)| (document.document_id.clone(), index))
            .collect();

        Self { documents, by_id }
    }

    pub fn lookup(&self, document_id: &str) -> Option<&Document> {
        self.by_id
            .get(document_id)
            .map(|index| &self.documents[*index])
    }

    /// All documents in ascending id order. Restartable: each call starts a
    /// fresh pass over the same immutable set.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Shared handle through which queries obtain the current snapshot.
///
/// Steady-state reads clone an `Arc` under a read lock; `install` swaps the
/// whole index at once. Readers see either the old snapshot or the new one,
/// never a mix.
#[derive(Clone, Default)]
pub struct CorpusHandle {
    inner: Arc<RwLock<Option<Arc<CorpusSnapshot>>>>,
}

impl CorpusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CorpusSnapshot) -> Self {
        let handle = Self::new();
        handle.install(snapshot);
        handle
    }

    pub fn install(&self, snapshot: CorpusSnapshot) {
        *self.inner.write() = Some(Arc::new(snapshot));
    }

    pub fn snapshot(&self) -> Result<Arc<CorpusSnapshot>, QueryError> {
        self.inner
            .read()
            .as_ref()
            .cloned()
            .ok_or(QueryError::CorpusUnavailable)
    }
}

pub struct SkippedRecord {
    pub path: PathBuf,
    pub reason: String,
}

pub struct LoadReport {
    pub snapshot: CorpusSnapshot,
    pub skipped: Vec<SkippedRecord>,
}

pub fn discover_record_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_record = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_record {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Loads every document record under `folder` into a fresh snapshot.
///
/// Malformed records are skipped with a warning and reported back; the load
/// fails only when the resulting corpus would be empty.
pub fn load_corpus(folder: &Path) -> Result<LoadReport, CorpusLoadError> {
    let files = discover_record_files(folder);

    if files.is_empty() {
        return Err(CorpusLoadError::InvalidArgument(format!(
            "no document records found in {}",
            folder.display()
        )));
    }

    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    for path in files {
        match read_record(&path) {
            Ok(document) => documents.push(document),
            Err(reason) => {
                warn!(path = %path.display(), %reason, "skipped corpus record");
                skipped.push(SkippedRecord { path, reason });
            }
        }
    }

    if documents.is_empty() {
        return Err(CorpusLoadError::EmptyCorpus(folder.display().to_string()));
    }

    Ok(LoadReport {
        snapshot: CorpusSnapshot::from_documents(documents),
        skipped,
    })
}

fn read_record(path: &Path) -> Result<Document, String> {
    let raw = fs::read_to_string(path).map_err(|error| error.to_string())?;
    let record: DocumentRecord = serde_json::from_str(&raw).map_err(|error| error.to_string())?;

    if record.title.trim().is_empty() || record.content.trim().is_empty() {
        return Err("record has empty title or content".to_string());
    }

    let now = Utc::now();
    Ok(Document {
        document_id: record
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| derive_document_id(path)),
        title: record.title,
        body: record.content,
        kind: record.document_type,
        source_url: record.source_url,
        created_at: record.created_at.unwrap_or(now),
        updated_at: record.updated_at.unwrap_or(now),
    })
}

fn derive_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}
