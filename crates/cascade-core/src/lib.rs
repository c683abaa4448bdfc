//! Cascade Core: link walker, deletion filter and backlink rewriter

pub mod model;
pub mod error;
pub mod corpus;
pub mod settings;
pub mod walker;
pub mod filter;
pub mod rewrite;
pub mod backlinks;
pub mod engine;


#[cfg(test)]
pub mod test_utils;

pub use model::{DocumentPath, ContentKind, LinkKind, LinkEdge, OutgoingReferences, ReferenceOccurrence, ReachableSet, DeletionScope, RewritePolicy, Operation, OperationFailure, DeletionOutcome};
pub use error::{CorpusError, SettingsError};
pub use corpus::{Corpus, Referrers};
pub use settings::{Settings, SETTINGS_DIR, SETTINGS_FILE, default_settings_path};
pub use walker::{LinkWalker, walk};
pub use filter::filter_candidates;
pub use rewrite::{ReferenceMatcher, LineRewrite, PLACEHOLDER_TEXT, display_name, rewrite_line};
pub use backlinks::{BacklinkRewriter, RewriteOptions, RewriteReport, content_hash};
pub use engine::{DeletionPlan, compute_deletion_set, execute_deletion};
