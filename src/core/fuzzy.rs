use strsim::normalized_levenshtein;

/// Default similarity a token must exceed to count as a match
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Approximate phrase-in-text matcher
///
/// The phrase is compared whole against every whitespace-separated token of
/// the haystack, so a multi-word phrase such as "heart disease" only matches
/// when some single token is close enough to the entire phrase.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: f64,
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True if any haystack token's similarity to the phrase strictly exceeds the threshold
    #[inline]
    pub fn matches(&self, phrase: &str, haystack: &str) -> bool {
        fuzzy_match(phrase, haystack, self.threshold)
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

/// Normalized edit-distance similarity in [0, 1], 1.0 for identical strings
#[inline]
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

pub fn fuzzy_match(phrase: &str, haystack: &str, threshold: f64) -> bool {
    let phrase = phrase.to_lowercase();
    haystack
        .split_whitespace()
        .any(|token| similarity(&phrase, token) > threshold)
}
