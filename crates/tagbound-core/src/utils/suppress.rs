//! Comment-based suppression directives.
//!
//! Supports directives like:
//! ```text
//! # tagbound: ignore reason="migration in progress"
//! from core.internal import Helper
//! ```
//!
//! Suppression is computed as a pre-pass: every directive comment is turned
//! into the line number it covers, and extraction looks statements up in the
//! resulting [`SuppressedLines`] map.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

const DIRECTIVE: &str = "tagbound:";

/// Parsed suppression directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreDirective {
    /// The reason provided, if any.
    pub reason: Option<String>,
}

/// Parses a suppression directive from comment text.
///
/// The text must start with `#`. Returns `None` if the comment is not a
/// directive.
#[must_use]
pub fn parse_ignore_directive(comment: &str) -> Option<IgnoreDirective> {
    let body = comment.trim().strip_prefix('#')?.trim();
    let directive = body.strip_prefix(DIRECTIVE)?.trim();
    let rest = directive.strip_prefix("ignore")?;

    // `ignorefoo` is not a directive
    if rest.chars().next().is_some_and(|c| !c.is_whitespace()) {
        return None;
    }

    let rest = rest.trim();
    let reason = rest.strip_prefix("reason=").and_then(|r| {
        let r = r.trim();
        let inner = r.strip_prefix('"')?;
        let end = inner.find('"')?;
        Some(inner[..end].to_string())
    });

    Some(IgnoreDirective { reason })
}

/// The 1-indexed line numbers covered by suppression directives in one file,
/// with the directive covering each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressedLines(BTreeMap<usize, IgnoreDirective>);

impl SuppressedLines {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a directive comment found at `line`.
    ///
    /// A comment alone on its line covers the next line. A comment trailing
    /// code covers its own line. The first directive recorded for a line wins.
    pub fn record(&mut self, line: usize, standalone: bool, directive: IgnoreDirective) {
        let covered = if standalone { line + 1 } else { line };
        self.0.entry(covered).or_insert(directive);
    }

    /// The first directive covering any line of a statement spanning `lines`.
    ///
    /// Multi-line statements are suppressed by a directive on any of their
    /// lines, including one trailing the closing line.
    #[must_use]
    pub fn find(&self, lines: RangeInclusive<usize>) -> Option<&IgnoreDirective> {
        self.0.range(lines).next().map(|(_, directive)| directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_directive() {
        let d = parse_ignore_directive("# tagbound: ignore").unwrap();
        assert!(d.reason.is_none());
    }

    #[test]
    fn test_parse_directive_with_reason() {
        let d = parse_ignore_directive("#tagbound: ignore reason=\"legacy adapter\"").unwrap();
        assert_eq!(d.reason.as_deref(), Some("legacy adapter"));
    }

    #[test]
    fn test_non_directives() {
        assert!(parse_ignore_directive("# just a comment").is_none());
        assert!(parse_ignore_directive("# tagbound: ignored").is_none());
        assert!(parse_ignore_directive("tagbound: ignore").is_none());
        assert!(parse_ignore_directive("# noqa: tagbound: ignore").is_none());
    }

    fn plain() -> IgnoreDirective {
        IgnoreDirective { reason: None }
    }

    #[test]
    fn test_standalone_covers_next_line() {
        let mut lines = SuppressedLines::new();
        lines.record(4, true, plain());
        assert!(lines.find(5..=5).is_some());
        assert!(lines.find(4..=4).is_none());
        assert!(lines.find(6..=6).is_none());
    }

    #[test]
    fn test_trailing_covers_own_line() {
        let mut lines = SuppressedLines::new();
        lines.record(7, false, plain());
        assert!(lines.find(7..=7).is_some());
        assert!(lines.find(8..=8).is_none());
    }

    #[test]
    fn test_find_over_statement_span() {
        let mut lines = SuppressedLines::new();
        lines.record(
            6,
            false,
            IgnoreDirective {
                reason: Some("vendored".to_string()),
            },
        );
        assert_eq!(
            lines.find(3..=6).and_then(|d| d.reason.as_deref()),
            Some("vendored")
        );
        assert!(lines.find(3..=5).is_none());
        assert!(lines.find(7..=9).is_none());
    }
}
