//! Link graph walker: everything reachable from a root document

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::corpus::Corpus;
use crate::error::CorpusError;
use crate::model::{DocumentPath, LinkEdge, LinkKind, ReachableSet};

/// Depth-first traversal over the host's forward-link cache.
///
/// Links are followed transitively when `recursive` is set; embeds are
/// collected where they are found but never traversed.
pub struct LinkWalker<'a, C: Corpus + ?Sized> {
    corpus: &'a C,
    recursive: bool,
}

impl<'a, C: Corpus + ?Sized> LinkWalker<'a, C> {
    pub fn new(corpus: &'a C, recursive: bool) -> Self {
        LinkWalker { corpus, recursive }
    }

    /// Collect every document reachable from `root`, root excluded.
    pub fn walk(&self, root: &DocumentPath) -> ReachableSet {
        let mut visited: HashSet<DocumentPath> = HashSet::new();
        let mut reachable = ReachableSet::new();
        let mut to_visit = vec![root.clone()];

        while let Some(current) = to_visit.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }

            let edges = match self.edges_from(&current) {
                Ok(edges) => edges,
                Err(e) => {
                    warn!("Skipping references of {}: {}", current, e);
                    continue;
                }
            };

            for edge in edges {
                if &edge.target == root {
                    continue;
                }

                match edge.kind {
                    LinkKind::Link => {
                        if visited.contains(&edge.target) {
                            continue;
                        }
                        reachable.insert(edge.target.clone());
                        if self.recursive {
                            to_visit.push(edge.target);
                        }
                    }
                    LinkKind::Embed => {
                        reachable.insert(edge.target);
                    }
                }
            }
        }

        debug!("Walk from {} reached {} documents", root, reachable.len());
        reachable
    }

    /// Resolved edges leaving `source`, derived from the host's cached
    /// references. Unresolved references are dropped.
    pub fn edges_from(&self, source: &DocumentPath) -> Result<Vec<LinkEdge>, CorpusError> {
        let references = self.corpus.outgoing_references(source)?;
        let edges = references
            .iter()
            .filter_map(|(kind, reference)| {
                let Some(target) = self.corpus.resolve_reference(reference, source) else {
                    debug!("Unresolved reference {:?} in {}", reference, source);
                    return None;
                };
                Some(LinkEdge {
                    source: source.clone(),
                    target,
                    kind,
                })
            })
            .collect();
        Ok(edges)
    }
}

/// Convenience wrapper around [`LinkWalker::walk`].
pub fn walk<C: Corpus + ?Sized>(corpus: &C, root: &DocumentPath, recursive: bool) -> ReachableSet {
    LinkWalker::new(corpus, recursive).walk(root)
}
