//! Deletion filter over content kind

use crate::model::{DeletionScope, DocumentPath, ReachableSet};

/// Narrow a reachable set to the documents `scope` allows, sorted by path.
pub fn filter_candidates(candidates: &ReachableSet, scope: DeletionScope) -> Vec<DocumentPath> {
    candidates
        .iter()
        .filter(|doc| scope.includes(doc.kind()))
        .cloned()
        .collect()
}
