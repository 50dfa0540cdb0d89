//! Prefix-range construction for title search
//!
//! Both backends answer "starts with" queries the same way: case-fold the
//! term, then run an ordered scan over a case-folded title key restricted to
//! the half-open range `[term, term + U+F8FF)`. Under byte/code-point
//! collation that yields exactly the records whose folded title begins with
//! the folded term. Prefix match only; no substring, no fuzzy, no
//! locale-aware folding.

/// Sentinel appended to the folded term to form the exclusive upper bound.
/// Sorts after any realistic title character.
pub const RANGE_SENTINEL: char = '\u{F8FF}';

/// Half-open scan range `[lower, upper)` over folded title keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRange {
    pub lower: String,
    pub upper: String,
}

impl PrefixRange {
    /// True when a folded title key falls inside the range
    pub fn contains(&self, title_key: &str) -> bool {
        title_key >= self.lower.as_str() && title_key < self.upper.as_str()
    }
}

/// Fold a title or search term into its index key
pub fn fold(s: &str) -> String {
    s.to_lowercase()
}

/// Build the scan range for a search term
pub fn prefix_range(term: &str) -> PrefixRange {
    let lower = fold(term);
    let mut upper = lower.clone();
    upper.push(RANGE_SENTINEL);
    PrefixRange { lower, upper }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_folded_and_half_open() {
        let range = prefix_range("AzI");
        assert_eq!(range.lower, "azi");
        assert_eq!(range.upper, format!("azi{}", RANGE_SENTINEL));
    }

    #[test]
    fn matches_prefixes_only() {
        let range = prefix_range("azi");
        assert!(range.contains(&fold("Aziz Lecture")));
        assert!(range.contains(&fold("Azim Talk")));
        assert!(range.contains("azi"));
        assert!(!range.contains(&fold("Best Azure")));
        assert!(!range.contains(&fold("az")));
        assert!(!range.contains(""));
    }

    #[test]
    fn empty_term_matches_everything_realistic() {
        let range = prefix_range("");
        assert!(range.contains("anything at all"));
        assert!(range.contains("я читаю"));
    }

    #[test]
    fn sentinel_sorts_after_title_characters() {
        // Code-point order: every BMP letter stays below the sentinel
        assert!('z' < RANGE_SENTINEL);
        assert!('ي' < RANGE_SENTINEL);
    }
}
