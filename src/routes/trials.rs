use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

use crate::config::MatchingSettings;
use crate::core::{query_text, MatchError, MatchResult, ScoringEngine};
use crate::models::{
    ErrorResponse, ExplanationResponse, HealthResponse, MatchTrialsRequest, MatchTrialsResponse,
    UserProfile,
};
use crate::services::{EmbeddingClient, EmbeddingError, ExplainerClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: ScoringEngine,
    pub embedder: Arc<EmbeddingClient>,
    pub explainer: Arc<ExplainerClient>,
    pub matching: MatchingSettings,
}

/// Reasons a match request cannot be served
#[derive(Debug, Error)]
enum MatchFailure {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Retrieval(#[from] MatchError),

    #[error("matching worker failed: {0}")]
    Worker(String),

    #[error("matching timed out after {0}s")]
    Timeout(u64),
}

/// Configure all trial-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/trials/match", web::post().to(match_trials))
        .route("/trials/{nct_id}/explain", web::post().to(explain_trial));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let catalog_size = state.engine.catalog_size();
    let status = if catalog_size > 0 { "healthy" } else { "degraded" };
    let cached_embeddings = match state.embedder.cache() {
        Some(cache) => cache.stats().await.entries,
        None => 0,
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        catalog_size,
        cached_embeddings,
    })
}

fn validation_error(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message,
        status_code: 400,
    })
}

/// Embed the profile's query text, then run the engine off the async workers
async fn run_match(
    state: &AppState,
    profile: UserProfile,
    top_k: usize,
) -> Result<MatchResult, MatchFailure> {
    let vector = state.embedder.embed(&query_text(&profile)).await?;

    let engine = state.engine.clone();
    let result = web::block(move || engine.match_trials(&profile, &vector, top_k))
        .await
        .map_err(|e| MatchFailure::Worker(e.to_string()))??;

    Ok(result)
}

/// Match trials endpoint
///
/// POST /api/v1/trials/match
///
/// Request body:
/// ```json
/// {
///   "profile": {
///     "age": 45, "gender": "female", "bmi": 24.5,
///     "conditions": ["asthma"], "smoker": "no", "alcohol": "light"
///   },
///   "top_k": 10
/// }
/// ```
async fn match_trials(
    state: web::Data<AppState>,
    req: web::Json<MatchTrialsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match request: {:?}", errors);
        return validation_error(errors.to_string());
    }

    let request = req.into_inner();
    // Cap top_k to prevent oversized responses
    let top_k = state.matching.resolve_top_k(request.top_k);
    let timeout_secs = state.matching.timeout_secs;

    tracing::info!(
        "Matching {} conditions, top_k: {}",
        request.profile.conditions.len(),
        top_k
    );

    // Timeouts are reported like retrieval failure
    let outcome = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        run_match(&state, request.profile, top_k),
    )
    .await
    .unwrap_or(Err(MatchFailure::Timeout(timeout_secs)));

    match outcome {
        Ok(result) => {
            let response = MatchTrialsResponse {
                request_id: uuid::Uuid::new_v4().to_string(),
                total_candidates: result.total_candidates,
                matches: result.trials,
            };

            tracing::info!(
                "Returning {} trials (from {} candidates), request {}",
                response.matches.len(),
                response.total_candidates,
                response.request_id
            );

            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            tracing::error!("Matching unavailable: {}", e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "matching_unavailable".to_string(),
                message: e.to_string(),
                status_code: 503,
            })
        }
    }
}

/// Explain trial endpoint
///
/// POST /api/v1/trials/{nct_id}/explain
///
/// Request body is the patient profile.
async fn explain_trial(
    state: web::Data<AppState>,
    path: web::Path<String>,
    profile: web::Json<UserProfile>,
) -> impl Responder {
    if let Err(errors) = profile.validate() {
        return validation_error(errors.to_string());
    }

    let nct_id = path.into_inner();
    let Some(trial) = state.engine.trial(&nct_id) else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "Trial not found".to_string(),
            message: format!("No trial with id {}", nct_id),
            status_code: 404,
        });
    };

    match state.explainer.explain(&profile, trial).await {
        Ok(explanation) => HttpResponse::Ok().json(ExplanationResponse {
            trial_id: nct_id,
            qualifies: explanation.qualifies,
            match_score: explanation.match_score,
            explanation: explanation.text,
        }),
        Err(e) => {
            tracing::error!("Explanation failed for {}: {}", nct_id, e);
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "Explanation failed".to_string(),
                message: e.to_string(),
                status_code: 502,
            })
        }
    }
}
