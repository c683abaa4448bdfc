//! Host collaborator interface

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::CorpusError;
use crate::model::{DocumentPath, OutgoingReferences, ReferenceOccurrence};

/// Referrers of one document, each with its line-level occurrences.
pub type Referrers = BTreeMap<DocumentPath, Vec<ReferenceOccurrence>>;

/// The document store and link index owned by the host.
///
/// Index lookups are synchronous reads of the host's cache; storage
/// primitives suspend the caller. The core never keeps an index of its own.
#[async_trait]
pub trait Corpus: Send + Sync {
    /// Cached outgoing links and embeds of a document.
    fn outgoing_references(&self, doc: &DocumentPath) -> Result<OutgoingReferences, CorpusError>;

    /// Map a reference as written in `context` to a document. `None` means unresolved.
    fn resolve_reference(&self, reference: &str, context: &DocumentPath) -> Option<DocumentPath>;

    /// Reverse-link lookup: every document referencing `doc`.
    fn referrers(&self, doc: &DocumentPath) -> Result<Referrers, CorpusError>;

    async fn read_text(&self, doc: &DocumentPath) -> Result<String, CorpusError>;

    /// Replace the entire content of `doc`.
    async fn write_text(&self, doc: &DocumentPath, content: &str) -> Result<(), CorpusError>;

    async fn remove_document(&self, doc: &DocumentPath) -> Result<(), CorpusError>;

    /// Copy `doc` below `destination_root` before it is removed.
    async fn copy_to_backup(
        &self,
        doc: &DocumentPath,
        destination_root: &Path,
    ) -> Result<(), CorpusError>;
}
