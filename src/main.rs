use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use std::sync::Arc;
use tracing::{info, error};
use trialmatch::config::Settings;
use trialmatch::core::ScoringEngine;
use trialmatch::routes::{self, trials::AppState};
use trialmatch::services::{EmbeddingCache, EmbeddingClient, ExplainerClient, TrialCatalog};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path payload errors
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn exit_with(message: String) -> ! {
    error!("{}", message);
    std::process::exit(1);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // Initialize logging (defaults when the configuration itself is broken)
    settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default()
        .init();

    info!("Starting TrialMatch service...");

    let settings = settings.unwrap_or_else(|e| exit_with(format!("Failed to load configuration: {}", e)));

    info!("Configuration loaded successfully");

    // Load catalog and build the similarity index
    let catalog = TrialCatalog::load(&settings.catalog.path)
        .unwrap_or_else(|e| exit_with(format!("Failed to load catalog {}: {}", settings.catalog.path, e)));

    let (trials, index) = catalog
        .into_index()
        .unwrap_or_else(|e| exit_with(format!("Failed to build index: {}", e)));

    info!("Index built: {} trials, {} dimensions", trials.len(), index.dimension());

    // Initialize embedding client with query cache
    let cache = EmbeddingCache::new(settings.embedding.cache_size, settings.embedding.cache_ttl_secs);
    let embedder = EmbeddingClient::new(
        settings.embedding.endpoint.clone(),
        settings.embedding.model.clone(),
        settings.embedding.timeout_secs,
    )
    .unwrap_or_else(|e| exit_with(format!("Failed to create embedding client: {}", e)))
    .with_cache(cache);

    info!(
        "Embedding client initialized ({} via {}, cache: {} entries)",
        settings.embedding.model, settings.embedding.endpoint, settings.embedding.cache_size
    );

    let explainer = ExplainerClient::new(
        settings.explainer.endpoint.clone(),
        settings.explainer.model.clone(),
        settings.explainer.timeout_secs,
    )
    .unwrap_or_else(|e| exit_with(format!("Failed to create explainer client: {}", e)));

    // Initialize engine with configured matching parameters
    let engine_config = settings.matching.engine_config();
    let engine = ScoringEngine::new(trials, Arc::new(index), engine_config);

    info!("Scoring engine initialized with config: {:?}", engine_config);

    // Build application state
    let app_state = AppState {
        engine,
        embedder: Arc::new(embedder),
        explainer: Arc::new(explainer),
        matching: settings.matching.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
