//! Reference extraction from markdown notes
//!
//! Recognized forms:
//! - `[[Target]]`, `[[Target|label]]`, `[[Target#Heading]]` - links
//! - `![[Target]]` - embeds
//! - `[label](Target.md)` - links, `![alt](image.png)` - embeds

use std::sync::LazyLock;

use cascade_core::LinkKind;
use regex::Regex;

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

static WIKILINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(!?)\[\[([^\[\]]+?)\]\]"));
static MARKDOWN_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r#"(!?)\[[^\[\]]*\]\(\s*<?([^()<>\s]+)>?(?:\s+"[^"]*")?\s*\)"#)
});

/// A reference found in a note, not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub kind: LinkKind,
    /// Target as written, fragment included, label dropped.
    pub target: String,
    /// 1-based line number.
    pub line: u32,
    /// Full matched text.
    pub original: String,
}

/// Extract every link and embed from note content, in document order.
pub fn parse_references(content: &str) -> Vec<ParsedReference> {
    let mut out = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        let mut found: Vec<(usize, ParsedReference)> = Vec::new();

        for caps in WIKILINK_REGEX.captures_iter(line) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let target = inner.as_str().split('|').next().unwrap_or_default().trim();
            if target.is_empty() || target.starts_with('#') {
                continue;
            }
            found.push((
                whole.start(),
                ParsedReference {
                    kind: kind_of(caps.get(1).map_or("", |m| m.as_str())),
                    target: target.to_string(),
                    line: line_no,
                    original: whole.as_str().to_string(),
                },
            ));
        }

        for caps in MARKDOWN_LINK_REGEX.captures_iter(line) {
            let (Some(whole), Some(url)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let Some(target) = normalize_markdown_target(url.as_str()) else {
                continue;
            };
            found.push((
                whole.start(),
                ParsedReference {
                    kind: kind_of(caps.get(1).map_or("", |m| m.as_str())),
                    target,
                    line: line_no,
                    original: whole.as_str().to_string(),
                },
            ));
        }

        found.sort_by_key(|(start, _)| *start);
        out.extend(found.into_iter().map(|(_, reference)| reference));
    }

    out
}

fn kind_of(bang: &str) -> LinkKind {
    if bang == "!" {
        LinkKind::Embed
    } else {
        LinkKind::Link
    }
}

/// Local targets only: URLs, mail links and same-page anchors are skipped.
fn normalize_markdown_target(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    if trimmed.is_empty()
        || lower.starts_with('#')
        || lower.contains("://")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }
    let decoded = trimmed.replace("%20", " ");
    Some(decoded)
}
