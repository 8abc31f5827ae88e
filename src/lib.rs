//! TrialMatch - clinical trial matching service
//!
//! This library ranks clinical trials for a patient profile. Eligibility
//! criteria are split into inclusion and exclusion sections, the patient's
//! conditions are fuzzy-matched against them, and the survivors are ordered by
//! condition matches and embedding similarity.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    fuzzy_match, split_criteria, CandidateRetriever, FlatIndex, MatchError, MatchResult,
    MatchingConfig, ScoringEngine,
};
pub use models::{
    Candidate, MatchTrialsRequest, MatchTrialsResponse, ScoredTrial, Trial, UserProfile,
};
