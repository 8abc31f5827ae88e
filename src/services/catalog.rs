use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::core::retrieval::{FlatIndex, RetrievalError};
use crate::models::Trial;
use crate::services::embedding::{EmbeddingClient, EmbeddingError};

/// Errors that can occur when loading or building the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog has {trials} trials but {vectors} vectors")]
    ShapeMismatch { trials: usize, vectors: usize },

    #[error("Index error: {0}")]
    Index(#[from] RetrievalError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Trial records with one embedding per record, index-aligned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialCatalog {
    pub trials: Vec<Trial>,
    #[serde(default)]
    pub vectors: Vec<Vec<f32>>,
}

impl TrialCatalog {
    /// Load an embedded catalog from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let bytes = fs::read(path.as_ref())?;
        let catalog: TrialCatalog = serde_json::from_slice(&bytes)?;
        catalog.check_shape()?;

        tracing::info!(
            "Loaded catalog of {} trials from {}",
            catalog.trials.len(),
            path.as_ref().display()
        );

        Ok(catalog)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CatalogError> {
        self.check_shape()?;
        write_json(path.as_ref(), self)
    }

    /// Embed the criteria text of every trial that has one
    ///
    /// Trials with empty criteria are dropped since they can never match.
    pub async fn vectorize(
        trials: Vec<Trial>,
        embedder: &EmbeddingClient,
    ) -> Result<Self, CatalogError> {
        let total = trials.len();
        let trials: Vec<Trial> = trials
            .into_iter()
            .filter(|t| !t.criteria_text.trim().is_empty())
            .collect();

        let mut vectors = Vec::with_capacity(trials.len());
        for (i, trial) in trials.iter().enumerate() {
            let vector = embedder.embed(&trial.criteria_text).await?;
            vectors.push(vector.as_ref().clone());

            if (i + 1) % 100 == 0 {
                tracing::info!("Embedded {}/{} trials", i + 1, trials.len());
            }
        }

        tracing::info!(
            "Embedded {} trials ({} skipped without criteria)",
            trials.len(),
            total - trials.len()
        );

        Ok(Self { trials, vectors })
    }

    /// Split into the shared record list and its nearest-neighbor index
    pub fn into_index(self) -> Result<(Arc<[Trial]>, FlatIndex), CatalogError> {
        self.check_shape()?;
        let index = FlatIndex::from_vectors(self.vectors)?;
        Ok((self.trials.into(), index))
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    fn check_shape(&self) -> Result<(), CatalogError> {
        if self.trials.len() != self.vectors.len() {
            return Err(CatalogError::ShapeMismatch {
                trials: self.trials.len(),
                vectors: self.vectors.len(),
            });
        }
        Ok(())
    }
}

/// Load raw (not yet embedded) trials written by the ingestion step
pub fn load_raw_trials<P: AsRef<Path>>(path: P) -> Result<Vec<Trial>, CatalogError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn save_raw_trials<P: AsRef<Path>>(path: P, trials: &[Trial]) -> Result<(), CatalogError> {
    write_json(path.as_ref(), &trials)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
