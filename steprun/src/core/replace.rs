//! Literal, bounded find/replace over in-memory text.

/// Text after replacement and the number of occurrences rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    pub text: String,
    pub replacements: usize,
}

/// Replace non-overlapping literal occurrences of `find` with `replace`.
///
/// `limit == 0` rewrites every occurrence; otherwise at most `limit`, scanning
/// left to right. An empty `find` matches at every char boundary, so `"ab"`
/// holds three occurrences.
pub fn replace_literal(haystack: &str, find: &str, replace: &str, limit: usize) -> Replaced {
    let occurrences = haystack.matches(find).count();
    if limit == 0 {
        Replaced {
            text: haystack.replace(find, replace),
            replacements: occurrences,
        }
    } else {
        Replaced {
            text: haystack.replacen(find, replace, limit),
            replacements: occurrences.min(limit),
        }
    }
}
