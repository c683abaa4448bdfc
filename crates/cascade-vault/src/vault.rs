//! Directory-backed corpus

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Context;
use async_trait::async_trait;
use cascade_core::{Corpus, CorpusError, DocumentPath, OutgoingReferences, Referrers, Settings};
use tracing::{debug, info, warn};

use crate::index::LinkIndex;

/// A folder of markdown notes and attachments with a live link index.
pub struct Vault {
    root: PathBuf,
    index: RwLock<LinkIndex>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("root", &self.root)
            .field("document_count", &self.document_count())
            .finish()
    }
}

impl Vault {
    /// Scan `root` and index every note. Hidden entries (`.obsidian/`,
    /// `.cascade/`, `.git/`) are skipped.
    pub async fn open(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::open_excluding(root, Vec::new()).await
    }

    /// Like [`Vault::open`], leaving out everything below the `excluded`
    /// folders. Relative folders are taken from the vault root.
    pub async fn open_excluding(
        root: impl AsRef<Path>,
        excluded: Vec<PathBuf>,
    ) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            anyhow::bail!("vault root {} is not a directory", root.display());
        }

        let excluded = excluded
            .iter()
            .map(|folder| resolve_under(&root, folder))
            .collect();
        let documents = scan_documents(&root, excluded);
        let mut notes: Vec<(DocumentPath, String)> = Vec::new();
        for doc in documents.iter().filter(|d| d.is_text()) {
            let path = root.join(doc.as_str());
            match tokio::fs::read(&path).await {
                Ok(bytes) => notes.push((doc.clone(), String::from_utf8_lossy(&bytes).into_owned())),
                Err(e) => warn!("Cannot read note {}: {}", path.display(), e),
            }
        }

        let index = LinkIndex::build(
            documents,
            notes.iter().map(|(doc, content)| (doc, content.as_str())),
        );
        info!(
            "Indexed {} documents, {} references in {}",
            index.document_count(),
            index.reference_count(),
            root.display()
        );

        Ok(Vault {
            root,
            index: RwLock::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn absolute_path(&self, doc: &DocumentPath) -> PathBuf {
        self.root.join(doc.as_str())
    }

    pub fn document_count(&self) -> usize {
        self.read_index().document_count()
    }

    pub fn contains(&self, doc: &DocumentPath) -> bool {
        self.read_index().contains(doc)
    }

    /// Turn user input into a document: a vault path, a filesystem path
    /// inside the vault, or a note name.
    pub fn find_document(&self, input: &str) -> Option<DocumentPath> {
        let as_path = Path::new(input);
        let relative = if as_path.is_absolute() {
            let canonical_root = self.root.canonicalize().ok()?;
            let canonical = as_path.canonicalize().ok()?;
            DocumentPath::from(canonical.strip_prefix(&canonical_root).ok()?)
        } else {
            DocumentPath::new(input)
        };
        if self.contains(&relative) {
            return Some(relative);
        }
        self.read_index()
            .resolve(relative.as_str(), &DocumentPath::new(""))
    }

    fn read_index(&self) -> RwLockReadGuard<'_, LinkIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, LinkIndex> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

}

fn resolve_under(root: &Path, folder: &Path) -> PathBuf {
    if folder.is_absolute() {
        folder.to_path_buf()
    } else {
        root.join(folder)
    }
}

/// Every non-hidden file below `root` as a vault path, `excluded` folders skipped.
fn scan_documents(root: &Path, excluded: Vec<PathBuf>) -> Vec<DocumentPath> {
    let mut documents = Vec::new();
    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .filter_entry(move |entry| !excluded.iter().any(|folder| entry.path().starts_with(folder)))
        .build();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Cannot read entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        match entry.path().strip_prefix(root) {
            Ok(relative) => documents.push(DocumentPath::from(relative)),
            Err(_) => debug!("Skipping {} outside the vault", entry.path().display()),
        }
    }
    documents.sort();
    documents
}

#[async_trait]
impl Corpus for Vault {
    fn outgoing_references(&self, doc: &DocumentPath) -> Result<OutgoingReferences, CorpusError> {
        self.read_index()
            .outgoing(doc)
            .ok_or_else(|| CorpusError::NotFound(doc.clone()))
    }

    fn resolve_reference(&self, reference: &str, context: &DocumentPath) -> Option<DocumentPath> {
        self.read_index().resolve(reference, context)
    }

    fn referrers(&self, doc: &DocumentPath) -> Result<Referrers, CorpusError> {
        let index = self.read_index();
        if !index.contains(doc) {
            return Err(CorpusError::NotFound(doc.clone()));
        }
        Ok(index.referrers(doc))
    }

    async fn read_text(&self, doc: &DocumentPath) -> Result<String, CorpusError> {
        let bytes = tokio::fs::read(self.absolute_path(doc))
            .await
            .map_err(|e| CorpusError::io(doc, e))?;
        String::from_utf8(bytes).map_err(|_| CorpusError::NotText(doc.clone()))
    }

    async fn write_text(&self, doc: &DocumentPath, content: &str) -> Result<(), CorpusError> {
        tokio::fs::write(self.absolute_path(doc), content)
            .await
            .map_err(|e| CorpusError::io(doc, e))?;
        self.write_index().reindex_document(doc, content);
        debug!("Wrote {} bytes to {}", content.len(), doc);
        Ok(())
    }

    async fn remove_document(&self, doc: &DocumentPath) -> Result<(), CorpusError> {
        tokio::fs::remove_file(self.absolute_path(doc))
            .await
            .map_err(|e| CorpusError::io(doc, e))?;
        self.write_index().remove_document(doc);
        Ok(())
    }

    async fn copy_to_backup(
        &self,
        doc: &DocumentPath,
        destination_root: &Path,
    ) -> Result<(), CorpusError> {
        let target = resolve_under(&self.root, destination_root).join(doc.as_str());
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CorpusError::io(doc, e))?;
        }
        tokio::fs::copy(self.absolute_path(doc), &target)
            .await
            .map_err(|e| CorpusError::io(doc, e))?;
        debug!("Backed up {} to {}", doc, target.display());
        Ok(())
    }
}

/// Open a vault for `settings`, attaching the path to any error.
///
/// The configured backup folder is not part of the vault, so earlier backups
/// are never indexed or resolved.
pub async fn open_vault(root: &Path, settings: &Settings) -> anyhow::Result<Vault> {
    let excluded = settings.backup_destination.iter().cloned().collect();
    Vault::open_excluding(root, excluded)
        .await
        .with_context(|| format!("failed to open vault at {}", root.display()))
}
