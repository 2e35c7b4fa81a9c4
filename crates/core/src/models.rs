use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Statute,
    Regulation,
    Case,
    Guideline,
}

/// An indexed legal document. Immutable once it enters a corpus snapshot;
/// reloads replace the whole snapshot rather than mutating documents in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub title: String,
    pub body: String,
    pub kind: Option<DocumentKind>,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire shape of one corpus record on disk. `title` and `content` are
/// required; everything else is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub document_type: Option<DocumentKind>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub query_id: Uuid,
    pub original: String,
    pub tokens: Vec<String>,
}

impl NormalizedQuery {
    pub fn token_set(&self) -> BTreeSet<&str> {
        self.tokens.iter().map(String::as_str).collect()
    }
}

/// A ranked hit: references a document by id, never by copy. Transient per
/// query, never persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub document_id: String,
    pub score: f64,
    pub matched_terms: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub document_id: String,
    pub title: String,
    pub excerpt: String,
    pub offset_start: usize,
    pub offset_end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub query_id: Uuid,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub top_k: usize,
    pub excerpt_window_chars: usize,
    pub title_weight: f64,
    pub body_weight: f64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            excerpt_window_chars: 250,
            title_weight: 3.0,
            body_weight: 1.0,
        }
    }
}
