// Service exports
pub mod cache;
pub mod catalog;
pub mod embedding;
pub mod explainer;
pub mod registry;

pub use cache::{CacheKey, CacheStats, EmbeddingCache};
pub use catalog::{load_raw_trials, save_raw_trials, CatalogError, TrialCatalog};
pub use embedding::{EmbeddingClient, EmbeddingError};
pub use explainer::{Explanation, ExplainerClient, ExplainerError};
pub use registry::{trial_from_study, FetchOptions, RegistryClient, RegistryError};
