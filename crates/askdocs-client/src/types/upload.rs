//! Upload request and response types

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::namespace::Namespace;

/// Document formats the backend indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Text,
    Pdf,
    Markdown,
}

impl FileType {
    /// Every format the backend accepts
    pub const ALL: [FileType; 3] = [Self::Text, Self::Pdf, Self::Markdown];

    /// Detect file type from a filename extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Pdf => "PDF",
            Self::Markdown => "Markdown",
        }
    }
}

/// Content of one upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadPayload {
    /// File bytes with the original filename
    File { filename: String, bytes: Vec<u8> },
    /// Raw pasted text
    Text(String),
}

/// One upload request to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct UploadTask {
    /// File or text content
    pub payload: UploadPayload,
    /// Display title, also sent to the backend
    pub title: String,
    /// Namespace to index into; unset lets the backend allocate one
    pub namespace: Option<Namespace>,
}

impl UploadTask {
    /// Build a file upload; the title defaults to the filename
    pub fn file(filename: impl Into<String>, bytes: Vec<u8>, title: Option<&str>) -> Self {
        let filename = filename.into();
        let title = non_blank(title).unwrap_or_else(|| filename.clone());
        Self {
            payload: UploadPayload::File { filename, bytes },
            title,
            namespace: None,
        }
    }

    /// Build a pasted-text upload
    ///
    /// Blank text is rejected here so it never reaches the backend.
    pub fn text(text: impl Into<String>, title: Option<&str>, default_title: &str) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::empty_input("some text"));
        }
        Ok(Self {
            payload: UploadPayload::Text(text),
            title: non_blank(title).unwrap_or_else(|| default_title.to_string()),
            namespace: None,
        })
    }

    /// Read a file from disk into an upload task
    pub async fn from_path(path: &Path, title: Option<&str>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::file(filename, bytes, title))
    }

    /// Target a namespace (or none)
    pub fn with_namespace(mut self, namespace: Option<Namespace>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Payload size in bytes
    pub fn size_bytes(&self) -> u64 {
        match &self.payload {
            UploadPayload::File { bytes, .. } => bytes.len() as u64,
            UploadPayload::Text(text) => text.len() as u64,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Indexing statistics returned by a successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadStats {
    /// Namespace the chunks landed in
    #[serde(default)]
    pub namespace: Option<String>,
    /// Number of chunks created
    pub chunks_created: u32,
    /// Average tokens per chunk
    #[serde(default)]
    pub avg_chunk_tokens: u32,
    /// Backend processing time in milliseconds
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl UploadStats {
    /// Returned namespace, if the backend sent a non-blank one
    pub fn namespace(&self) -> Option<Namespace> {
        self.namespace.clone().and_then(Namespace::new)
    }

    /// One-line summary of the indexing statistics
    pub fn summary(&self) -> String {
        format!(
            "{} chunks · ~{} tokens/chunk · {}ms",
            self.chunks_created, self.avg_chunk_tokens, self.processing_time_ms
        )
    }
}

/// Success body of the upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub stats: UploadStats,
}

/// Outcome of a single upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadResult {
    /// Document was chunked and indexed
    Indexed { message: String, stats: UploadStats },
    /// Upload failed; only the message is known
    Failed { message: String },
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Indexed { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Indexed { message, .. } | Self::Failed { message } => message,
        }
    }

    pub fn stats(&self) -> Option<&UploadStats> {
        match self {
            Self::Indexed { stats, .. } => Some(stats),
            Self::Failed { .. } => None,
        }
    }

    pub fn chunks_created(&self) -> Option<u32> {
        self.stats().map(|s| s.chunks_created)
    }

}

/// Index overview from the document listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    #[serde(default)]
    pub total_vectors: u64,
    #[serde(default)]
    pub namespaces: Vec<String>,
}

impl IndexSummary {
    pub fn contains(&self, namespace: &Namespace) -> bool {
        self.namespaces.iter().any(|ns| ns == namespace.as_str())
    }
}
