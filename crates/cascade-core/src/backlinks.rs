//! Backlink rewriter: strips references to deleted documents from their referrers
//!
//! Each referrer is read once, transformed in memory and, if anything
//! changed, overwritten in full. There is no lock between the read and the
//! write: an edit made by someone else in between is lost unless
//! `verify_before_write` is on, in which case the document is re-read and the
//! write is skipped when it no longer matches what was transformed.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};

use tracing::{debug, info, warn};

use crate::corpus::{Corpus, Referrers};
use crate::model::{DocumentPath, Operation, OperationFailure, RewritePolicy};
use crate::rewrite::ReferenceMatcher;
use crate::settings::Settings;

/// Options controlling a rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    pub policy: RewritePolicy,
    pub list_items_standalone: bool,
    pub verify_before_write: bool,
}

impl From<&Settings> for RewriteOptions {
    fn from(settings: &Settings) -> Self {
        RewriteOptions {
            policy: settings.reference_rewrite_policy,
            list_items_standalone: settings.treat_list_item_reference_as_standalone,
            verify_before_write: settings.verify_before_write,
        }
    }
}

/// What one rewrite pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub rewritten: Vec<DocumentPath>,
    /// Referrers skipped because they changed between read and write.
    pub conflicts: Vec<DocumentPath>,
    pub failures: Vec<OperationFailure>,
}

pub struct BacklinkRewriter<'a, C: Corpus + ?Sized> {
    corpus: &'a C,
    options: RewriteOptions,
}

impl<'a, C: Corpus + ?Sized> BacklinkRewriter<'a, C> {
    pub fn new(corpus: &'a C, options: RewriteOptions) -> Self {
        BacklinkRewriter { corpus, options }
    }

    /// Ask the host index for the referrers of every document in `targets`.
    ///
    /// Lookup failures are reported and the affected target contributes no referrers.
    pub fn collect_referrers(
        &self,
        targets: &[DocumentPath],
    ) -> (BTreeMap<DocumentPath, Referrers>, Vec<OperationFailure>) {
        let mut collected = BTreeMap::new();
        let mut failures = Vec::new();
        for target in targets {
            match self.corpus.referrers(target) {
                Ok(referrers) => {
                    debug!("{} has {} referrers", target, referrers.len());
                    collected.insert(target.clone(), referrers);
                }
                Err(e) => {
                    warn!("Cannot look up referrers of {}: {}", target, e);
                    failures.push(OperationFailure {
                        path: target.clone(),
                        operation: Operation::Referrers,
                        message: e.to_string(),
                    });
                }
            }
        }
        (collected, failures)
    }

    /// Rewrite every referrer of `deleted`, looking referrers up now.
    pub async fn rewrite(&self, deleted: &[DocumentPath]) -> RewriteReport {
        let (referrers, mut failures) = self.collect_referrers(deleted);
        let mut report = self.rewrite_with(deleted, &referrers).await;
        failures.append(&mut report.failures);
        report.failures = failures;
        report
    }

    /// Rewrite using a referrer snapshot taken earlier, e.g. before removal.
    pub async fn rewrite_with(
        &self,
        deleted: &[DocumentPath],
        referrers: &BTreeMap<DocumentPath, Referrers>,
    ) -> RewriteReport {
        let mut report = RewriteReport::default();
        if deleted.is_empty() {
            return report;
        }

        let deleted_set: HashSet<&DocumentPath> = deleted.iter().collect();
        let matcher = ReferenceMatcher::for_documents(deleted);

        // A referrer pointing at several deleted documents is processed once.
        let documents: BTreeSet<&DocumentPath> = deleted
            .iter()
            .filter_map(|target| referrers.get(target))
            .flat_map(|r| r.keys())
            .filter(|referrer| !deleted_set.contains(referrer))
            .collect();

        for document in documents {
            self.rewrite_document(document, &matcher, &mut report).await;
        }

        info!(
            "Rewrote {} referrers ({} failures, {} conflicts)",
            report.rewritten.len(),
            report.failures.len(),
            report.conflicts.len()
        );
        report
    }

    async fn rewrite_document(
        &self,
        document: &DocumentPath,
        matcher: &ReferenceMatcher,
        report: &mut RewriteReport,
    ) {
        let content = match self.corpus.read_text(document).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Cannot read referrer {}: {}", document, e);
                report.failures.push(failure(document, Operation::Read, e));
                return;
            }
        };

        let Some(updated) = matcher.rewrite_content(
            &content,
            self.options.policy,
            self.options.list_items_standalone,
        ) else {
            debug!("No literal reference left in {}", document);
            return;
        };

        if self.options.verify_before_write {
            match self.corpus.read_text(document).await {
                Ok(current) if content_hash(&current) == content_hash(&content) => {}
                Ok(_) => {
                    warn!("{} changed while being rewritten, leaving it untouched", document);
                    report.conflicts.push(document.clone());
                    return;
                }
                Err(e) => {
                    warn!("Cannot re-read referrer {}: {}", document, e);
                    report.failures.push(failure(document, Operation::Read, e));
                    return;
                }
            }
        }

        match self.corpus.write_text(document, &updated).await {
            Ok(()) => {
                info!("Removed references from {}", document);
                report.rewritten.push(document.clone());
            }
            Err(e) => {
                warn!("Cannot write referrer {}: {}", document, e);
                report.failures.push(failure(document, Operation::Write, e));
            }
        }
    }
}

fn failure(path: &DocumentPath, operation: Operation, error: impl ToString) -> OperationFailure {
    OperationFailure {
        path: path.clone(),
        operation,
        message: error.to_string(),
    }
}

/// Hash of document content, used to detect concurrent edits.
pub fn content_hash(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}
