// Unit tests for the matching building blocks

use trialmatch::core::{
    calculate_condition_score, calculate_semantic_score, fuzzy_match, is_excluded,
    split_criteria, CriteriaParser, FuzzyMatcher, MissingInclusionPolicy,
};

fn conditions(items: &[&str]) -> Vec<String> {
    items.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_cancer_scenario_inclusion_only() {
    let parsed = split_criteria("Inclusion Criteria: patients with cancer diagnosis");
    let matcher = FuzzyMatcher::new(0.8);
    let conds = conditions(&["cancer"]);

    assert!(!is_excluded(&conds, &parsed.exclusion_text, &matcher));
    assert_eq!(calculate_condition_score(&conds, &parsed.inclusion_text, &matcher), 1);
}

#[test]
fn test_cancer_scenario_excluded() {
    let parsed = split_criteria(
        "Inclusion Criteria: patients with cancer\nExclusion Criteria: prior cancer treatment",
    );
    let matcher = FuzzyMatcher::new(0.8);
    let conds = conditions(&["cancer"]);

    assert_eq!(calculate_condition_score(&conds, &parsed.inclusion_text, &matcher), 1);
    assert!(is_excluded(&conds, &parsed.exclusion_text, &matcher));
}

#[test]
fn test_semantic_score_scenarios() {
    assert_eq!(calculate_semantic_score(0.0, 4), 1.0);
    assert_eq!(calculate_semantic_score(1.0, 4), 0.5);
    assert_eq!(calculate_semantic_score(3.0, 4), 0.25);
}

#[test]
fn test_no_headers_scores_zero() {
    let parsed = split_criteria("Adults with cancer and no prior chemotherapy");
    assert_eq!(parsed.inclusion_text, "");
    assert_eq!(parsed.exclusion_text, "");

    let score = calculate_condition_score(&conditions(&["cancer"]), &parsed.inclusion_text, &FuzzyMatcher::default());
    assert_eq!(score, 0);
}

#[test]
fn test_whole_text_policy_rescues_headerless_criteria() {
    let parser = CriteriaParser::new(MissingInclusionPolicy::WholeText);
    let parsed = parser.parse("Adults with cancer and no prior chemotherapy");

    let score = calculate_condition_score(&conditions(&["cancer"]), &parsed.inclusion_text, &FuzzyMatcher::default());
    assert_eq!(score, 1);
}

#[test]
fn test_segments_are_lowercase() {
    let parsed = split_criteria("INCLUSION CRITERIA: Type 2 DIABETES\nEXCLUSION CRITERIA: Pregnant WOMEN");
    assert_eq!(parsed.inclusion_text, "type 2 diabetes");
    assert_eq!(parsed.exclusion_text, "pregnant women");
}

#[test]
fn test_fuzzy_match_tolerates_typos() {
    // One substitution in six characters: 1 - 1/6 ≈ 0.833
    assert!(fuzzy_match("asthma", "severe asthmo", 0.8));
    assert!(!fuzzy_match("asthma", "severe allergy", 0.8));
}

#[test]
fn test_condition_score_bounded_by_condition_count() {
    let conds = conditions(&["asthma", "diabetes"]);
    let score = calculate_condition_score(
        &conds,
        "asthma asthma diabetes diabetes asthma",
        &FuzzyMatcher::default(),
    );
    assert_eq!(score, 2);
}
