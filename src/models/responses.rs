use serde::{Deserialize, Serialize};
use crate::models::domain::ScoredTrial;

/// Response for the match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchTrialsResponse {
    pub request_id: String,
    pub matches: Vec<ScoredTrial>,
    pub total_candidates: usize,
}

/// Response for the explain endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub trial_id: String,
    pub qualifies: Option<String>,
    pub match_score: Option<String>,
    pub explanation: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub catalog_size: usize,
    pub cached_embeddings: u64,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
