//! Pure text rewriting of references to deleted documents
//!
//! Nothing in here touches the corpus. The I/O pass lives in
//! [`backlinks`](crate::backlinks).

use std::borrow::Cow;

use regex::{Captures, Regex, RegexBuilder};

use crate::model::{DocumentPath, RewritePolicy};

/// Marker substituted under [`RewritePolicy::Placeholder`].
pub const PLACEHOLDER_TEXT: &str = "BACKLINK REMOVED";

/// Name a document is referenced by: file name without the text suffix.
pub fn display_name(path: &DocumentPath) -> String {
    let file_name = path.file_name();
    if path.is_text() {
        if let Some((stem, _)) = file_name.rsplit_once('.') {
            return stem.to_string();
        }
    }
    file_name.to_string()
}

/// Result of rewriting a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRewrite {
    Unchanged,
    Replaced(String),
    /// The line held nothing but a reference and is dropped.
    Removed,
}

/// Matches references to any of a set of display names.
///
/// Wikilinks (`[[…]]`, `![[…]]`) and markdown links (`[label](…)`,
/// `![alt](…)`) are matched with an optional `.md` suffix and `#heading` /
/// `#^block` fragment, case-insensitively. Wikilinks may carry a `|label`.
/// A folder prefix is only accepted when it names the document's own folder.
#[derive(Debug, Clone)]
pub struct ReferenceMatcher {
    pattern: Option<Regex>,
}

/// Upper bound on repeated passes over one line.
const MAX_PASSES: usize = 8;

impl ReferenceMatcher {
    /// Matcher for bare display names, without folder prefixes.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_alternatives(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_string())
                .filter(|n| !n.is_empty())
                .map(|n| escape_name(&n))
                .collect(),
        )
    }

    /// Matcher for the display names of `deleted`, each optionally qualified
    /// by a trailing part of its own folder.
    pub fn for_documents<'a>(deleted: impl IntoIterator<Item = &'a DocumentPath>) -> Self {
        Self::from_alternatives(
            deleted
                .into_iter()
                .filter(|doc| !display_name(doc).trim().is_empty())
                .map(document_alternative)
                .collect(),
        )
    }

    fn from_alternatives(mut alternatives: Vec<String>) -> Self {
        alternatives.sort();
        alternatives.dedup();
        if alternatives.is_empty() {
            return ReferenceMatcher { pattern: None };
        }

        let names = alternatives.join("|");
        let wikilink = format!(
            r"!?\[\[(?P<target>(?:{names})(?:\.md)?(?:#[^\[\]|]*)?)(?:\|(?P<label>[^\[\]]*))?\]\]"
        );
        let markdown = format!(
            r#"!?\[(?P<mdlabel>[^\[\]]*)\]\(\s*<?(?P<mdtarget>(?:\./)?(?:{names})(?:\.md)?(?:#[^()<>\s]*)?)>?(?:\s+"[^"]*")?\s*\)"#
        );
        let source = format!("{wikilink}|{markdown}");
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| tracing::warn!("Cannot build reference pattern: {}", e))
            .ok();

        ReferenceMatcher { pattern }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    /// Whether `text` contains at least one matching reference.
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }

    /// Whether the trimmed line is exactly one matching reference, or with
    /// `list_items`, a single bullet item holding exactly one.
    pub fn is_standalone(&self, line: &str, list_items: bool) -> bool {
        let Some(pattern) = &self.pattern else {
            return false;
        };
        let mut candidate = line.trim();
        if list_items {
            candidate = strip_bullet(candidate);
        }
        pattern
            .find(candidate)
            .is_some_and(|m| m.start() == 0 && m.end() == candidate.len())
    }

    /// Rewrite one line. Passes repeat until the line stops changing, so a
    /// reference uncovered by removing a nested one is handled too.
    pub fn rewrite_line(&self, line: &str, policy: RewritePolicy, list_items: bool) -> LineRewrite {
        let Some(pattern) = &self.pattern else {
            return LineRewrite::Unchanged;
        };

        let mut current = line.to_string();
        for _ in 0..MAX_PASSES {
            if !pattern.is_match(&current) {
                break;
            }
            if self.is_standalone(&current, list_items) {
                return LineRewrite::Removed;
            }
            let next = pattern
                .replace_all(&current, |caps: &Captures<'_>| replacement(caps, policy))
                .into_owned();
            if next == current {
                break;
            }
            current = next;
        }

        if current == line {
            LineRewrite::Unchanged
        } else {
            LineRewrite::Replaced(current)
        }
    }

    /// Rewrite a whole document. `None` when no line changed.
    pub fn rewrite_content(
        &self,
        content: &str,
        policy: RewritePolicy,
        list_items: bool,
    ) -> Option<String> {
        if !self.is_match(content) {
            return None;
        }

        let mut changed = false;
        let mut lines: Vec<Cow<'_, str>> = Vec::new();
        for line in content.split('\n') {
            match self.rewrite_line(line, policy, list_items) {
                LineRewrite::Unchanged => lines.push(Cow::Borrowed(line)),
                LineRewrite::Replaced(new_line) => {
                    changed = true;
                    lines.push(Cow::Owned(new_line));
                }
                LineRewrite::Removed => changed = true,
            }
        }

        changed.then(|| lines.join("\n"))
    }
}

/// Literal regex for a name. Spaces also match their `%20` form used in
/// markdown link targets.
fn escape_name(name: &str) -> String {
    regex::escape(name).replace(' ', "(?: |%20)")
}

/// `(?:(?:a/b|b)/)?Note` for `a/b/Note.md`.
fn document_alternative(doc: &DocumentPath) -> String {
    let name = escape_name(display_name(doc).trim());
    let segments: Vec<&str> = doc.parent().split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return name;
    }
    let folders: Vec<String> = (0..segments.len())
        .map(|start| escape_name(&segments[start..].join("/")))
        .collect();
    format!("(?:(?:{})/)?{}", folders.join("|"), name)
}

fn replacement(caps: &Captures<'_>, policy: RewritePolicy) -> String {
    match policy {
        RewritePolicy::Strip => String::new(),
        RewritePolicy::Placeholder => PLACEHOLDER_TEXT.to_string(),
        RewritePolicy::KeepLabel => visible_label(caps),
    }
}

fn visible_label(caps: &Captures<'_>) -> String {
    let label = caps.name("label").or_else(|| caps.name("mdlabel"));
    if let Some(label) = label {
        let label = label.as_str().trim();
        if !label.is_empty() {
            return label.to_string();
        }
    }
    let target = caps
        .name("target")
        .or_else(|| caps.name("mdtarget"))
        .map_or(String::new(), |m| m.as_str().replace("%20", " "));
    let target = target.trim_start_matches("./");
    let (base, fragment) = match target.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (target, None),
    };
    let base = strip_md_suffix(base);
    match fragment {
        Some(fragment) => format!("{base}#{fragment}"),
        None => base.to_string(),
    }
}

/// `- item`, `* item` and `+ item` become `item`.
fn strip_bullet(line: &str) -> &str {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some('-' | '*' | '+'), Some(c)) if c.is_whitespace() => line[1..].trim_start(),
        _ => line,
    }
}

fn strip_md_suffix(name: &str) -> &str {
    let len = name.len();
    if len > 3 && name.is_char_boundary(len - 3) && name[len - 3..].eq_ignore_ascii_case(".md") {
        &name[..len - 3]
    } else {
        name
    }
}

/// Rewrite one line against a set of display names.
///
/// Returns the new line (`None` when the line is dropped) and whether it changed.
pub fn rewrite_line(
    line: &str,
    names: &[String],
    policy: RewritePolicy,
    list_items: bool,
) -> (Option<String>, bool) {
    match ReferenceMatcher::new(names).rewrite_line(line, policy, list_items) {
        LineRewrite::Unchanged => (Some(line.to_string()), false),
        LineRewrite::Replaced(new_line) => (Some(new_line), true),
        LineRewrite::Removed => (None, true),
    }
}
