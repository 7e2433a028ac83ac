//! Unified diff previews for file mutations.

use similar::TextDiff;

/// Lines of context around each hunk when no configuration overrides it.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Render a unified diff between `before` and `after` labelled with `label`.
///
/// Headers read `<label> (before)` / `<label> (after)`. Identical inputs
/// (including empty-to-empty) produce an empty string.
pub fn unified_diff(before: &str, after: &str, label: &str) -> String {
    unified_diff_with_context(before, after, label, DEFAULT_CONTEXT_LINES)
}

pub fn unified_diff_with_context(before: &str, after: &str, label: &str, context: usize) -> String {
    if before == after {
        return String::new();
    }
    let old_header = format!("{label} (before)");
    let new_header = format!("{label} (after)");
    let diff = TextDiff::from_lines(before, after);
    let rendered = diff
        .unified_diff()
        .context_radius(context)
        .header(&old_header, &new_header)
        .to_string();
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_yield_empty_diff() {
        assert_eq!(unified_diff("", "", "a.txt"), "");
    }

    #[test]
    fn identical_inputs_yield_empty_diff() {
        assert_eq!(unified_diff("same\n", "same\n", "a.txt"), "");
    }

    #[test]
    fn diff_carries_before_after_headers() {
        let diff = unified_diff("hello\n", "hi\n", "a.txt");
        assert!(diff.starts_with("--- a.txt (before)\n+++ a.txt (after)\n"));
        assert!(diff.contains("-hello\n"));
        assert!(diff.contains("+hi\n"));
    }

    #[test]
    fn new_file_diff_only_adds_lines() {
        let diff = unified_diff("", "one\ntwo\n", "new.txt");
        assert!(diff.contains("+one\n"));
        assert!(diff.contains("+two\n"));
        assert!(!diff.lines().any(|l| l.starts_with('-') && !l.starts_with("---")));
    }

    #[test]
    fn context_radius_limits_unchanged_lines() {
        let before = "1\n2\n3\n4\n5\n6\n7\n";
        let after = "1\n2\n3\nX\n5\n6\n7\n";
        let narrow = unified_diff_with_context(before, after, "n.txt", 0);
        assert!(!narrow.contains(" 3\n"));
        let wide = unified_diff_with_context(before, after, "n.txt", 3);
        assert!(wide.contains(" 3\n"));
        assert!(wide.contains(" 7\n"));
    }
}
