use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::core::{
    criteria::{CriteriaParser, MissingInclusionPolicy},
    fuzzy::{FuzzyMatcher, DEFAULT_FUZZY_THRESHOLD},
    retrieval::{CandidateRetriever, RetrievalError},
    scoring::{
        calculate_condition_score, calculate_semantic_score, is_excluded,
        DEFAULT_SEMANTIC_PRECISION,
    },
};
use crate::models::{Candidate, ScoredTrial, Trial, UserProfile};

/// Default number of neighbors pulled from the index before filtering
pub const DEFAULT_RETRIEVAL_BREADTH: usize = 100;

/// Errors that fail a whole matching call
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(#[from] RetrievalError),
}

/// Engine parameters, fixed at construction
#[derive(Debug, Clone, Copy)]
pub struct MatchingConfig {
    pub fuzzy_threshold: f64,
    pub retrieval_breadth: usize,
    pub semantic_precision: u32,
    pub missing_inclusion: MissingInclusionPolicy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            retrieval_breadth: DEFAULT_RETRIEVAL_BREADTH,
            semantic_precision: DEFAULT_SEMANTIC_PRECISION,
            missing_inclusion: MissingInclusionPolicy::Empty,
        }
    }
}

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub trials: Vec<ScoredTrial>,
    pub total_candidates: usize,
}

/// Text embedded to build the query vector for a profile
pub fn query_text(profile: &UserProfile) -> String {
    format!("Clinical trials for: {}", profile.conditions.join(", "))
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Nearest-neighbor retrieval of `retrieval_breadth` candidates
/// 2. Deduplication by trial id (first occurrence wins)
/// 3. Exclusion filter: any condition matching the exclusion segment drops the trial
/// 4. Relevance filter: at least one condition must match the inclusion segment
/// 5. Ranking by condition score, then semantic score, then truncation
///
/// The catalog and retriever are shared read-only, so one engine serves
/// concurrent calls without locking.
#[derive(Clone)]
pub struct ScoringEngine {
    catalog: Arc<[Trial]>,
    retriever: Arc<dyn CandidateRetriever>,
    config: MatchingConfig,
    parser: CriteriaParser,
    fuzzy: FuzzyMatcher,
}

impl ScoringEngine {
    pub fn new(
        catalog: Arc<[Trial]>,
        retriever: Arc<dyn CandidateRetriever>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            catalog,
            retriever,
            parser: CriteriaParser::new(config.missing_inclusion),
            fuzzy: FuzzyMatcher::new(config.fuzzy_threshold),
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn catalog_size(&self) -> usize {
        self.catalog.len()
    }

    /// Look up a catalog trial by registry id
    pub fn trial(&self, id: &str) -> Option<&Trial> {
        self.catalog.iter().find(|trial| trial.id == id)
    }

    /// Rank the catalog for a profile given its embedded query vector
    ///
    /// # Arguments
    /// * `profile` - The patient profile
    /// * `query_vector` - Embedding of [`query_text`] for the profile
    /// * `top_k` - Maximum number of trials to return
    ///
    /// # Errors
    /// Fails only when the retriever cannot be queried.
    pub fn match_trials(
        &self,
        profile: &UserProfile,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<MatchResult, MatchError> {
        let candidates = self
            .retriever
            .retrieve(query_vector, self.config.retrieval_breadth)?;

        Ok(self.rank_candidates(profile, &candidates, top_k))
    }

    /// Filter, score, sort and truncate already retrieved candidates
    ///
    /// Candidates must be in retrieval order; that order decides which
    /// duplicate survives and breaks exact score ties.
    pub fn rank_candidates(
        &self,
        profile: &UserProfile,
        candidates: &[Candidate],
        top_k: usize,
    ) -> MatchResult {
        let conditions = profile.normalized_conditions();
        let mut seen: HashSet<&str> = HashSet::with_capacity(candidates.len());

        let mut scored: Vec<ScoredTrial> = candidates
            .iter()
            .filter_map(|candidate| {
                let trial = match self.catalog.get(candidate.record_index) {
                    Some(trial) => trial,
                    None => {
                        tracing::warn!(
                            "Retriever returned record {} outside catalog of {} trials",
                            candidate.record_index,
                            self.catalog.len()
                        );
                        return None;
                    }
                };

                // Stage 2: deduplicate before any filtering
                if !seen.insert(trial.id.as_str()) {
                    return None;
                }

                self.score_trial(trial, candidate.distance, &conditions)
            })
            .collect();

        // Stable sort keeps retrieval order for exact ties
        scored.sort_by(|a, b| {
            b.condition_score
                .cmp(&a.condition_score)
                .then_with(|| b.semantic_score.total_cmp(&a.semantic_score))
        });

        let survivors = scored.len();
        scored.truncate(top_k);

        tracing::debug!(
            "Ranked {} candidates: {} survived filtering, returning {}",
            candidates.len(),
            survivors,
            scored.len()
        );

        MatchResult {
            trials: scored,
            total_candidates: candidates.len(),
        }
    }

    /// Stages 3 and 4 for a single trial
    fn score_trial(&self, trial: &Trial, distance: f32, conditions: &[String]) -> Option<ScoredTrial> {
        let criteria = self.parser.parse(&trial.criteria_text);

        // Exclusion always overrides inclusion
        if is_excluded(conditions, &criteria.exclusion_text, &self.fuzzy) {
            tracing::trace!("Trial {} excluded by exclusion criteria", trial.id);
            return None;
        }

        let condition_score = calculate_condition_score(conditions, &criteria.inclusion_text, &self.fuzzy);
        if condition_score == 0 {
            return None;
        }

        Some(ScoredTrial {
            trial: trial.clone(),
            condition_score,
            semantic_score: calculate_semantic_score(distance, self.config.semantic_precision),
        })
    }
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine")
            .field("catalog_size", &self.catalog.len())
            .field("config", &self.config)
            .finish()
    }
}
