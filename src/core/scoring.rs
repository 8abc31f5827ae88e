use crate::core::fuzzy::FuzzyMatcher;

/// Number of decimal digits kept on semantic scores
pub const DEFAULT_SEMANTIC_PRECISION: u32 = 4;

/// Count the conditions that fuzzy-match the inclusion segment
pub fn calculate_condition_score(
    conditions: &[String],
    inclusion_text: &str,
    matcher: &FuzzyMatcher,
) -> u32 {
    conditions
        .iter()
        .filter(|condition| matcher.matches(condition, inclusion_text))
        .count() as u32
}

/// True if any condition fuzzy-matches the exclusion segment
pub fn is_excluded(conditions: &[String], exclusion_text: &str, matcher: &FuzzyMatcher) -> bool {
    conditions
        .iter()
        .any(|condition| matcher.matches(condition, exclusion_text))
}

/// Map a retrieval distance to a similarity in (0, 1]
///
/// score = 1 / (1 + distance), rounded half away from zero to `precision` digits.
/// Distance 0 gives 1.0 and the score decreases monotonically towards 0.
/// Scores that would round to zero are held at one unit of the last digit
/// so every surviving trial keeps a positive score. A NaN distance scores
/// like an infinitely distant one.
#[inline]
pub fn calculate_semantic_score(distance: f32, precision: u32) -> f64 {
    let distance = if distance.is_nan() {
        f64::INFINITY
    } else {
        f64::from(distance).max(0.0)
    };
    let factor = 10f64.powi(precision as i32);
    let rounded = (factor / (1.0 + distance)).round();
    rounded.max(1.0) / factor
}
