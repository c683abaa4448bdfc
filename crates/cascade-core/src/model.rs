//! Core data structures for the deletion pipeline

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Corpus-relative path of a document, always with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPath(String);

impl DocumentPath {
    pub fn new(path: impl Into<String>) -> Self {
        let raw: String = path.into();
        let normalized = raw.replace('\\', "/");
        DocumentPath(normalized.trim_start_matches("./").trim_start_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, e.g. `Note.md` for `notes/Note.md`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Folder portion of the path, empty for top-level documents.
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Lower-cased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn kind(&self) -> ContentKind {
        ContentKind::from_path(self)
    }

    pub fn is_text(&self) -> bool {
        self.kind() == ContentKind::Text
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentPath {
    fn from(value: &str) -> Self {
        DocumentPath::new(value)
    }
}

impl From<String> for DocumentPath {
    fn from(value: String) -> Self {
        DocumentPath::new(value)
    }
}

impl From<&Path> for DocumentPath {
    fn from(value: &Path) -> Self {
        DocumentPath::new(value.to_string_lossy().into_owned())
    }
}

/// Text notes versus everything else in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    /// Markdown note.
    Text,
    /// Images, PDFs, audio and any other non-note file.
    Attachment,
}

impl ContentKind {
    /// Detect content kind from the file extension.
    pub fn from_path(path: &DocumentPath) -> Self {
        match path.extension().as_deref() {
            Some("md") | Some("markdown") => ContentKind::Text,
            _ => ContentKind::Attachment,
        }
    }
}

/// How a document refers to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    /// Textual reference: `[[target]]` or `[label](target.md)`.
    Link,
    /// Transclusion: `![[target]]` or `![alt](target.png)`. Never traversed.
    Embed,
}

/// A directed, resolved reference between two documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkEdge {
    pub source: DocumentPath,
    pub target: DocumentPath,
    pub kind: LinkKind,
}

/// Unresolved reference texts cached by the host for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingReferences {
    pub links: Vec<String>,
    pub embeds: Vec<String>,
}

impl OutgoingReferences {
    /// Iterate over every reference together with its kind.
    pub fn iter(&self) -> impl Iterator<Item = (LinkKind, &str)> {
        self.links
            .iter()
            .map(|r| (LinkKind::Link, r.as_str()))
            .chain(self.embeds.iter().map(|r| (LinkKind::Embed, r.as_str())))
    }
}

/// One line-level occurrence of a reference inside a referrer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOccurrence {
    /// 1-based line number.
    pub line: u32,
    /// The reference exactly as written, e.g. `![[Note#Intro]]`.
    pub original: String,
}

/// Every document discovered from one root, root excluded.
pub type ReachableSet = BTreeSet<DocumentPath>;

/// Which documents of the reachable set are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionScope {
    #[default]
    All,
    #[serde(alias = "text_only", alias = "textOnly")]
    TextOnly,
    #[serde(alias = "attachments_only", alias = "attachmentsOnly")]
    AttachmentsOnly,
}

impl DeletionScope {
    pub fn includes(self, kind: ContentKind) -> bool {
        match self {
            DeletionScope::All => true,
            DeletionScope::TextOnly => kind == ContentKind::Text,
            DeletionScope::AttachmentsOnly => kind == ContentKind::Attachment,
        }
    }
}

/// How an inline reference to a deleted document is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewritePolicy {
    /// Remove the reference text entirely.
    #[default]
    Strip,
    /// Remove the brackets, keep the visible label.
    #[serde(alias = "keep_label", alias = "keepLabel")]
    KeepLabel,
    /// Substitute a fixed marker.
    Placeholder,
}

/// Per-document step that can fail during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Backup,
    Delete,
    Referrers,
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Backup => "backup",
            Operation::Delete => "delete",
            Operation::Referrers => "referrers",
            Operation::Read => "read",
            Operation::Write => "write",
        };
        f.write_str(name)
    }
}

/// A recoverable failure on a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub path: DocumentPath,
    pub operation: Operation,
    pub message: String,
}

/// Summary of one `execute_deletion` run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletionOutcome {
    /// Documents removed from the corpus.
    pub deleted: Vec<DocumentPath>,
    /// Documents copied to the backup destination.
    pub backed_up: Vec<DocumentPath>,
    /// Referrers whose content was rewritten.
    pub rewritten: Vec<DocumentPath>,
    pub failures: Vec<OperationFailure>,
    /// Configuration problems surfaced before any destructive step.
    pub warnings: Vec<String>,
    /// RFC 3339 completion time.
    pub finished_at: Option<String>,
}

impl DeletionOutcome {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.warnings.is_empty()
    }

    pub(crate) fn record_failure(
        &mut self,
        path: &DocumentPath,
        operation: Operation,
        message: impl Into<String>,
    ) {
        self.failures.push(OperationFailure {
            path: path.clone(),
            operation,
            message: message.into(),
        });
    }
}
