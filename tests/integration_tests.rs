// Integration tests for TrialMatch

use std::sync::Arc;
use trialmatch::core::{FlatIndex, MatchingConfig, ScoringEngine};
use trialmatch::models::{Alcohol, Candidate, Gender, Smoker, Trial, UserProfile};

fn create_trial(id: &str, criteria: &str) -> Trial {
    Trial {
        id: id.to_string(),
        title: format!("Trial {}", id),
        conditions: vec![],
        min_age: "18 Years".to_string(),
        max_age: "75 Years".to_string(),
        gender: "ALL".to_string(),
        criteria_text: criteria.to_string(),
        status: "RECRUITING".to_string(),
        phase: "PHASE2".to_string(),
        sponsor: "Test Sponsor".to_string(),
        enrollment: Some(50),
        url: format!("https://clinicaltrials.gov/ct2/show/{}", id),
    }
}

fn create_profile(conditions: &[&str]) -> UserProfile {
    UserProfile {
        age: 50,
        gender: Gender::Male,
        bmi: 27.0,
        conditions: conditions.iter().map(|c| c.to_string()).collect(),
        smoker: Smoker::Unspecified,
        alcohol: Alcohol::None,
    }
}

/// Catalog mixing relevant, excluded, irrelevant and duplicated trials,
/// embedded on a line so distance grows with position
fn create_engine() -> ScoringEngine {
    let trials = vec![
        create_trial("NCT001", "Inclusion Criteria: adults with asthma"),
        create_trial("NCT002", "Inclusion Criteria: asthma or diabetes"),
        create_trial("NCT003", "Inclusion Criteria: asthma\nExclusion Criteria: diabetes"),
        create_trial("NCT004", "Inclusion Criteria: hypertension"),
        create_trial("NCT005", "Eligible participants have diabetes"),
        create_trial("NCT001", "Inclusion Criteria: asthma and diabetes"),
        create_trial("NCT006", "Inclusion Criteria: type 2 diabetes"),
        create_trial("NCT007", "Inclusion Criteria: diabetes, asthma"),
    ];
    let vectors = (0..trials.len()).map(|i| vec![i as f32, 0.0]).collect();
    let index = FlatIndex::from_vectors(vectors).unwrap();

    ScoringEngine::new(trials.into(), Arc::new(index), MatchingConfig::default())
}

#[test]
fn test_integration_end_to_end_matching() {
    let engine = create_engine();
    let profile = create_profile(&["asthma", "diabetes"]);

    let result = engine.match_trials(&profile, &[0.0, 0.0], 10).unwrap();
    let ids: Vec<&str> = result.trials.iter().map(|t| t.trial.id.as_str()).collect();

    // NCT003 excluded, NCT004/NCT005 irrelevant, second NCT001 deduplicated
    assert_eq!(ids, vec!["NCT002", "NCT007", "NCT001", "NCT006"]);
    assert_eq!(result.total_candidates, 8);

    let scores: Vec<u32> = result.trials.iter().map(|t| t.condition_score).collect();
    assert_eq!(scores, vec![2, 2, 1, 1]);
}

#[test]
fn test_exclusion_precedence() {
    let engine = create_engine();
    let profile = create_profile(&["asthma", "diabetes"]);

    let result = engine.match_trials(&profile, &[0.0, 0.0], 10).unwrap();
    assert!(result.trials.iter().all(|t| t.trial.id != "NCT003"));
}

#[test]
fn test_score_bounds() {
    let engine = create_engine();
    let profile = create_profile(&["asthma", "diabetes"]);

    let result = engine.match_trials(&profile, &[3.5, 0.0], 10).unwrap();
    for scored in &result.trials {
        assert!(scored.semantic_score > 0.0 && scored.semantic_score <= 1.0);
        assert!(scored.condition_score >= 1 && scored.condition_score <= 2);
    }
}

#[test]
fn test_sort_correctness() {
    let engine = create_engine();
    let profile = create_profile(&["asthma", "diabetes"]);

    let result = engine.match_trials(&profile, &[4.0, 0.0], 10).unwrap();
    for pair in result.trials.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.condition_score > b.condition_score
                || (a.condition_score == b.condition_score && a.semantic_score >= b.semantic_score),
            "{} ranked above {} out of order",
            a.trial.id,
            b.trial.id
        );
    }
}

#[test]
fn test_determinism() {
    let engine = create_engine();
    let profile = create_profile(&["asthma", "diabetes"]);

    let first = engine.match_trials(&profile, &[2.0, 1.0], 10).unwrap();
    let second = engine.match_trials(&profile, &[2.0, 1.0], 10).unwrap();

    assert_eq!(
        serde_json::to_string(&first.trials).unwrap(),
        serde_json::to_string(&second.trials).unwrap()
    );
}

#[test]
fn test_no_duplicate_ids() {
    let engine = create_engine();
    let profile = create_profile(&["asthma", "diabetes"]);

    let result = engine.match_trials(&profile, &[5.0, 0.0], 10).unwrap();
    let mut ids: Vec<&str> = result.trials.iter().map(|t| t.trial.id.as_str()).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn test_top_k_cap_is_exact() {
    let engine = create_engine();
    let profile = create_profile(&["asthma", "diabetes"]);

    for top_k in 0..6 {
        let result = engine.match_trials(&profile, &[0.0, 0.0], top_k).unwrap();
        assert_eq!(result.trials.len(), top_k.min(4));
    }
}

#[test]
fn test_retrieval_breadth_limits_candidates() {
    let trials: Vec<Trial> = (0..10)
        .map(|i| create_trial(&format!("NCT{:03}", i), "Inclusion Criteria: asthma"))
        .collect();
    let vectors = (0..10).map(|i| vec![i as f32]).collect();
    let index = FlatIndex::from_vectors(vectors).unwrap();
    let config = MatchingConfig {
        retrieval_breadth: 3,
        ..MatchingConfig::default()
    };
    let engine = ScoringEngine::new(trials.into(), Arc::new(index), config);

    let result = engine.match_trials(&create_profile(&["asthma"]), &[0.0], 10).unwrap();
    assert_eq!(result.total_candidates, 3);
    assert_eq!(result.trials.len(), 3);
}

#[test]
fn test_rank_candidates_keeps_first_duplicate() {
    let engine = create_engine();
    let profile = create_profile(&["asthma"]);

    // Index 5 is the second NCT001 record; seen first here, so it wins
    let candidates = vec![
        Candidate { record_index: 5, distance: 1.0 },
        Candidate { record_index: 0, distance: 0.0 },
    ];
    let result = engine.rank_candidates(&profile, &candidates, 10);

    assert_eq!(result.trials.len(), 1);
    assert_eq!(result.trials[0].trial.criteria_text, "Inclusion Criteria: asthma and diabetes");
    assert_eq!(result.trials[0].semantic_score, 0.5);
}

#[test]
fn test_concurrent_calls_share_engine() {
    let engine = create_engine();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                engine
                    .match_trials(&create_profile(&["asthma", "diabetes"]), &[0.0, 0.0], 10)
                    .unwrap()
                    .trials
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
