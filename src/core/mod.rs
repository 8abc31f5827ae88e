// Core algorithm exports
pub mod criteria;
pub mod fuzzy;
pub mod matcher;
pub mod retrieval;
pub mod scoring;

pub use criteria::{split_criteria, CriteriaParser, MissingInclusionPolicy};
pub use fuzzy::{fuzzy_match, similarity, FuzzyMatcher};
pub use matcher::{query_text, MatchError, MatchResult, MatchingConfig, ScoringEngine};
pub use retrieval::{CandidateRetriever, FlatIndex, RetrievalError};
pub use scoring::{calculate_condition_score, calculate_semantic_score, is_excluded};
