//! Entry points used by the host: plan a deletion, then execute it

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backlinks::{BacklinkRewriter, RewriteOptions};
use crate::corpus::{Corpus, Referrers};
use crate::filter::filter_candidates;
use crate::model::{DeletionOutcome, DocumentPath, Operation};
use crate::settings::Settings;
use crate::walker::LinkWalker;

/// Documents selected for removal from one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionPlan {
    pub root: DocumentPath,
    /// Everything the walk reached, before the scope filter.
    pub reachable: usize,
    pub candidates: Vec<DocumentPath>,
}

impl DeletionPlan {
    /// Nothing matched the configured scope. Not an error.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Walk from `root` and filter the result by the configured scope.
pub fn compute_deletion_set<C: Corpus + ?Sized>(
    corpus: &C,
    root: &DocumentPath,
    settings: &Settings,
) -> DeletionPlan {
    let reachable = LinkWalker::new(corpus, settings.recursive_descent).walk(root);
    let candidates = filter_candidates(&reachable, settings.deletion_scope);
    info!(
        "{} reachable from {}, {} selected for deletion",
        reachable.len(),
        root,
        candidates.len()
    );
    DeletionPlan {
        root: root.clone(),
        reachable: reachable.len(),
        candidates,
    }
}

/// Back up, remove and optionally clean up references to `candidates`.
///
/// Every document is handled independently; failures end up in the outcome
/// instead of aborting the batch.
pub async fn execute_deletion<C: Corpus + ?Sized>(
    corpus: &C,
    candidates: &[DocumentPath],
    settings: &Settings,
) -> DeletionOutcome {
    let mut outcome = DeletionOutcome::default();

    let backup_destination = match settings.backup_destination() {
        Ok(dest) => dest,
        Err(e) => {
            warn!("{}", e);
            outcome.warnings.push(e.to_string());
            if settings.require_backup {
                warn!("Backup is required, nothing was deleted");
                outcome.finished_at = Some(chrono::Utc::now().to_rfc3339());
                return outcome;
            }
            None
        }
    };

    let rewriter = BacklinkRewriter::new(corpus, RewriteOptions::from(settings));

    // Referrers are looked up before removal; the host index may drop them afterwards.
    let referrers: BTreeMap<DocumentPath, Referrers> = if settings.cleanup_references {
        let (referrers, failures) = rewriter.collect_referrers(candidates);
        outcome.failures.extend(failures);
        referrers
    } else {
        BTreeMap::new()
    };

    for doc in candidates {
        if let Some(dest) = backup_destination {
            match corpus.copy_to_backup(doc, dest).await {
                Ok(()) => outcome.backed_up.push(doc.clone()),
                Err(e) => {
                    warn!("Backup of {} failed: {}", doc, e);
                    outcome.record_failure(doc, Operation::Backup, e.to_string());
                    if settings.require_backup {
                        continue;
                    }
                }
            }
        }

        match corpus.remove_document(doc).await {
            Ok(()) => {
                info!("Deleted {}", doc);
                outcome.deleted.push(doc.clone());
            }
            Err(e) => {
                warn!("Cannot delete {}: {}", doc, e);
                outcome.record_failure(doc, Operation::Delete, e.to_string());
            }
        }
    }

    if settings.cleanup_references && !outcome.deleted.is_empty() {
        let report = rewriter.rewrite_with(&outcome.deleted, &referrers).await;
        outcome.rewritten = report.rewritten;
        outcome.failures.extend(report.failures);
        for conflict in report.conflicts {
            outcome.record_failure(
                &conflict,
                Operation::Write,
                "document changed between read and write, left untouched",
            );
        }
    }

    outcome.finished_at = Some(chrono::Utc::now().to_rfc3339());
    info!(
        "Deleted {} of {} documents, {} failures",
        outcome.deleted_count(),
        candidates.len(),
        outcome.failures.len()
    );
    outcome
}
