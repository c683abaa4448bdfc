//! Forward/reverse link index using petgraph::StableDiGraph keyed by document path

use std::collections::HashMap;

use cascade_core::{
    DocumentPath, LinkKind, OutgoingReferences, ReferenceOccurrence, Referrers,
};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::parser::{ParsedReference, parse_references};

/// Edge weight: one resolved occurrence of a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedReference {
    pub kind: LinkKind,
    pub line: u32,
    pub original: String,
}

/// The vault's link graph. Nodes are documents, edges are resolved references.
pub struct LinkIndex {
    inner: StableDiGraph<DocumentPath, IndexedReference>,
    nodes: HashMap<DocumentPath, NodeIndex>,
    /// Parsed references per note, resolved or not.
    parsed: HashMap<DocumentPath, Vec<ParsedReference>>,
}

impl std::fmt::Debug for LinkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkIndex")
            .field("document_count", &self.inner.node_count())
            .field("reference_count", &self.inner.edge_count())
            .finish()
    }
}

impl LinkIndex {
    pub fn new() -> Self {
        LinkIndex {
            inner: StableDiGraph::new(),
            nodes: HashMap::new(),
            parsed: HashMap::new(),
        }
    }

    /// Build an index from every document path and the contents of the notes.
    pub fn build<'a>(
        documents: impl IntoIterator<Item = DocumentPath>,
        notes: impl IntoIterator<Item = (&'a DocumentPath, &'a str)>,
    ) -> Self {
        let mut index = LinkIndex::new();
        for doc in documents {
            index.add_document(doc);
        }
        let notes: Vec<(&DocumentPath, &str)> = notes.into_iter().collect();
        for (doc, _) in &notes {
            index.add_document((*doc).clone());
        }
        // Every node exists before any edge is resolved.
        for (doc, content) in notes {
            index.parsed.insert(doc.clone(), parse_references(content));
        }
        let sources: Vec<DocumentPath> = index.parsed.keys().cloned().collect();
        for source in sources {
            index.connect(&source);
        }
        index
    }

    /// Add a document node. Returns its index, existing or new.
    pub fn add_document(&mut self, doc: DocumentPath) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&doc) {
            return idx;
        }
        let idx = self.inner.add_node(doc.clone());
        self.nodes.insert(doc, idx);
        idx
    }

    pub fn contains(&self, doc: &DocumentPath) -> bool {
        self.nodes.contains_key(doc)
    }

    /// Total number of documents.
    pub fn document_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of resolved reference occurrences.
    pub fn reference_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Unresolved outgoing references of a note; empty for attachments.
    pub fn outgoing(&self, doc: &DocumentPath) -> Option<OutgoingReferences> {
        if !self.contains(doc) {
            return None;
        }
        let mut references = OutgoingReferences::default();
        for parsed in self.parsed.get(doc).into_iter().flatten() {
            match parsed.kind {
                LinkKind::Link => references.links.push(parsed.target.clone()),
                LinkKind::Embed => references.embeds.push(parsed.target.clone()),
            }
        }
        Some(references)
    }

    /// Every document referencing `target`, with line-level occurrences.
    pub fn referrers(&self, target: &DocumentPath) -> Referrers {
        let mut referrers = Referrers::new();
        let Some(&idx) = self.nodes.get(target) else {
            return referrers;
        };
        for edge_ref in self.inner.edges_directed(idx, Direction::Incoming) {
            let Some(source) = self.inner.node_weight(edge_ref.source()) else {
                continue;
            };
            if edge_ref.source() == idx {
                continue;
            }
            let reference = edge_ref.weight();
            referrers
                .entry(source.clone())
                .or_insert_with(Vec::new)
                .push(ReferenceOccurrence {
                    line: reference.line,
                    original: reference.original.clone(),
                });
        }
        for occurrences in referrers.values_mut() {
            occurrences.sort_by_key(|o| o.line);
        }
        referrers
    }

    /// Map a reference as written in `context` to a document.
    ///
    /// Tries, in order: the exact vault path, the path with `.md`, the path
    /// relative to the source's folder, then a case-insensitive match on the
    /// trailing path segments preferring the shortest path.
    pub fn resolve(&self, reference: &str, context: &DocumentPath) -> Option<DocumentPath> {
        let target = strip_fragment(reference);
        if target.is_empty() {
            return None;
        }
        let target = target.replace('\\', "/");

        let relative = resolve_relative(context.parent(), &target);
        let direct = [
            DocumentPath::new(target.as_str()),
            DocumentPath::new(format!("{target}.md")),
        ];
        let relative = relative
            .into_iter()
            .flat_map(|p| [DocumentPath::new(p.as_str()), DocumentPath::new(format!("{p}.md"))]);
        if let Some(found) = direct.into_iter().chain(relative).find(|p| self.contains(p)) {
            return Some(found);
        }

        let wanted = DocumentPath::new(target.as_str()).as_str().to_lowercase();
        let wanted_md = format!("{wanted}.md");
        self.nodes
            .keys()
            .filter(|doc| {
                let lower = doc.as_str().to_lowercase();
                [&wanted, &wanted_md].iter().any(|w| {
                    lower == **w || lower.ends_with(&format!("/{w}"))
                })
            })
            .min_by(|a, b| {
                a.as_str()
                    .len()
                    .cmp(&b.as_str().len())
                    .then_with(|| a.as_str().cmp(b.as_str()))
            })
            .cloned()
    }

    /// Remove a document and every edge touching it.
    pub fn remove_document(&mut self, doc: &DocumentPath) -> bool {
        self.parsed.remove(doc);
        match self.nodes.remove(doc) {
            Some(idx) => self.inner.remove_node(idx).is_some(),
            None => false,
        }
    }

    /// Re-parse a note after its content changed.
    pub fn reindex_document(&mut self, doc: &DocumentPath, content: &str) {
        let idx = self.add_document(doc.clone());
        let stale: Vec<_> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge_ref| edge_ref.id())
            .collect();
        for edge in stale {
            self.inner.remove_edge(edge);
        }
        if doc.is_text() {
            self.parsed.insert(doc.clone(), parse_references(content));
            self.connect(doc);
        }
    }

    fn connect(&mut self, source: &DocumentPath) {
        let Some(&source_idx) = self.nodes.get(source) else {
            return;
        };
        let Some(parsed) = self.parsed.get(source) else {
            return;
        };
        let resolved: Vec<(NodeIndex, IndexedReference)> = parsed
            .iter()
            .filter_map(|reference| {
                let target = self.resolve(&reference.target, source)?;
                let target_idx = *self.nodes.get(&target)?;
                Some((
                    target_idx,
                    IndexedReference {
                        kind: reference.kind,
                        line: reference.line,
                        original: reference.original.clone(),
                    },
                ))
            })
            .collect();
        for (target_idx, reference) in resolved {
            self.inner.add_edge(source_idx, target_idx, reference);
        }
    }
}

impl Default for LinkIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// `Note#Heading|label` becomes `Note`.
fn strip_fragment(reference: &str) -> &str {
    let end = reference.find(['#', '|']).unwrap_or(reference.len());
    reference[..end].trim()
}

/// Resolve `target` against `folder`, honouring `.` and `..` segments.
/// `None` when the path climbs above the vault root.
fn resolve_relative(folder: &str, target: &str) -> Option<String> {
    if target.starts_with('/') {
        return None;
    }
    let mut segments: Vec<&str> = folder.split('/').filter(|s| !s.is_empty()).collect();
    for part in target.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
