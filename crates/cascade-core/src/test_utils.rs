//! Test utilities for Cascade

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::corpus::{Corpus, Referrers};
use crate::error::CorpusError;
use crate::model::{DocumentPath, LinkKind, OutgoingReferences, ReferenceOccurrence};
use crate::rewrite::display_name;

#[derive(Default)]
struct State {
    contents: BTreeMap<DocumentPath, String>,
    backups: Vec<(DocumentPath, PathBuf)>,
    pending_edits: HashMap<DocumentPath, String>,
}

/// In-memory corpus with explicit link tables and failure injection.
#[derive(Default)]
pub struct MemoryCorpus {
    references: HashMap<DocumentPath, OutgoingReferences>,
    state: Mutex<State>,
    failing_references: HashSet<DocumentPath>,
    failing_reads: HashSet<DocumentPath>,
    failing_writes: HashSet<DocumentPath>,
    failing_removals: HashSet<DocumentPath>,
    failing_backups: HashSet<DocumentPath>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, path: &str, content: &str) -> Self {
        self.lock().contents.insert(path.into(), content.to_string());
        self
    }

    /// Add a `[[reference]]` from `source`, creating `source` if needed.
    pub fn link(self, source: &str, reference: &str) -> Self {
        self.reference(source, reference, LinkKind::Link)
    }

    /// Add a `![[reference]]` from `source`, creating `source` if needed.
    pub fn embed(self, source: &str, reference: &str) -> Self {
        self.reference(source, reference, LinkKind::Embed)
    }

    fn reference(mut self, source: &str, reference: &str, kind: LinkKind) -> Self {
        let source = DocumentPath::from(source);
        self.lock().contents.entry(source.clone()).or_default();
        let entry = self.references.entry(source).or_default();
        match kind {
            LinkKind::Link => entry.links.push(reference.to_string()),
            LinkKind::Embed => entry.embeds.push(reference.to_string()),
        }
        self
    }

    pub fn failing_references(mut self, path: &str) -> Self {
        self.failing_references.insert(path.into());
        self
    }

    pub fn failing_read(mut self, path: &str) -> Self {
        self.failing_reads.insert(path.into());
        self
    }

    pub fn failing_write(mut self, path: &str) -> Self {
        self.failing_writes.insert(path.into());
        self
    }

    pub fn failing_removal(mut self, path: &str) -> Self {
        self.failing_removals.insert(path.into());
        self
    }

    pub fn failing_backup(mut self, path: &str) -> Self {
        self.failing_backups.insert(path.into());
        self
    }

    /// Replace `path` with `content` right after its next read, as if another
    /// editor saved it.
    pub fn concurrent_edit(self, path: &str, content: &str) -> Self {
        self.lock().pending_edits.insert(path.into(), content.to_string());
        self
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.lock().contents.get(&DocumentPath::from(path)).cloned()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lock().contents.contains_key(&DocumentPath::from(path))
    }

    pub fn backups(&self) -> Vec<(DocumentPath, PathBuf)> {
        self.lock().backups.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Corpus for MemoryCorpus {
    fn outgoing_references(&self, doc: &DocumentPath) -> Result<OutgoingReferences, CorpusError> {
        if self.failing_references.contains(doc) {
            return Err(CorpusError::Other(format!("metadata unavailable for {doc}")));
        }
        Ok(self.references.get(doc).cloned().unwrap_or_default())
    }

    fn resolve_reference(&self, reference: &str, _context: &DocumentPath) -> Option<DocumentPath> {
        let wanted = reference.split(['#', '|']).next().unwrap_or(reference).trim();
        let state = self.lock();
        state
            .contents
            .keys()
            .find(|doc| {
                let without_suffix = doc.as_str().strip_suffix(".md").unwrap_or(doc.as_str());
                doc.as_str().eq_ignore_ascii_case(wanted)
                    || without_suffix.eq_ignore_ascii_case(wanted)
                    || display_name(doc).eq_ignore_ascii_case(wanted)
            })
            .cloned()
    }

    fn referrers(&self, doc: &DocumentPath) -> Result<Referrers, CorpusError> {
        let mut referrers = Referrers::new();
        let existing: Vec<DocumentPath> = self.lock().contents.keys().cloned().collect();
        for source in existing {
            let Some(references) = self.references.get(&source) else {
                continue;
            };
            for (kind, reference) in references.iter() {
                if self.resolve_reference(reference, &source).as_ref() != Some(doc) {
                    continue;
                }
                let original = match kind {
                    LinkKind::Link => format!("[[{reference}]]"),
                    LinkKind::Embed => format!("![[{reference}]]"),
                };
                referrers
                    .entry(source.clone())
                    .or_insert_with(Vec::new)
                    .push(ReferenceOccurrence { line: 1, original });
            }
        }
        Ok(referrers)
    }

    async fn read_text(&self, doc: &DocumentPath) -> Result<String, CorpusError> {
        if self.failing_reads.contains(doc) {
            return Err(CorpusError::io(doc, std::io::Error::other("read refused")));
        }
        let mut state = self.lock();
        let content = state
            .contents
            .get(doc)
            .cloned()
            .ok_or_else(|| CorpusError::NotFound(doc.clone()))?;
        if let Some(edit) = state.pending_edits.remove(doc) {
            state.contents.insert(doc.clone(), edit);
        }
        Ok(content)
    }

    async fn write_text(&self, doc: &DocumentPath, content: &str) -> Result<(), CorpusError> {
        if self.failing_writes.contains(doc) {
            return Err(CorpusError::io(doc, std::io::Error::other("write refused")));
        }
        self.lock().contents.insert(doc.clone(), content.to_string());
        Ok(())
    }

    async fn remove_document(&self, doc: &DocumentPath) -> Result<(), CorpusError> {
        if self.failing_removals.contains(doc) {
            return Err(CorpusError::io(doc, std::io::Error::other("delete refused")));
        }
        self.lock()
            .contents
            .remove(doc)
            .map(|_| ())
            .ok_or_else(|| CorpusError::NotFound(doc.clone()))
    }

    async fn copy_to_backup(
        &self,
        doc: &DocumentPath,
        destination_root: &Path,
    ) -> Result<(), CorpusError> {
        if self.failing_backups.contains(doc) {
            return Err(CorpusError::io(doc, std::io::Error::other("backup refused")));
        }
        self.lock().backups.push((doc.clone(), destination_root.to_path_buf()));
        Ok(())
    }
}

/// Build the set form of a list of paths.
pub fn paths(items: &[&str]) -> crate::model::ReachableSet {
    items.iter().map(|p| DocumentPath::from(*p)).collect()
}
