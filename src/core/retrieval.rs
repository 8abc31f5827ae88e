use thiserror::Error;

use crate::models::Candidate;

/// Errors raised at the similarity-index boundary
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Similarity index unavailable: {0}")]
    Unavailable(String),

    #[error("Query vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Nearest-neighbor lookup over the trial catalog
///
/// Implementations return at most `k` candidates ordered by ascending
/// distance, where distance is non-negative and 0 means identical. A `k`
/// larger than the catalog returns every record.
pub trait CandidateRetriever: Send + Sync {
    fn retrieve(&self, query_vector: &[f32], k: usize) -> Result<Vec<Candidate>, RetrievalError>;
}

/// Exact brute-force index using squared Euclidean distance
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build an index over `vectors`; record `i` is the vector at position `i`.
    pub fn new(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self, RetrievalError> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(RetrievalError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }
        Ok(Self { dimension, vectors })
    }

    /// Build an index taking the dimension from the first vector
    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Result<Self, RetrievalError> {
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        Self::new(dimension, vectors)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl CandidateRetriever for FlatIndex {
    fn retrieve(&self, query_vector: &[f32], k: usize) -> Result<Vec<Candidate>, RetrievalError> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query_vector.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: query_vector.len(),
            });
        }

        let mut candidates: Vec<Candidate> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(record_index, vector)| Candidate {
                record_index,
                distance: squared_l2(query_vector, vector),
            })
            .collect();

        // Ties keep catalog order
        candidates.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.record_index.cmp(&b.record_index))
        });
        candidates.truncate(k);

        Ok(candidates)
    }
}

#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> FlatIndex {
        FlatIndex::from_vectors(vec![
            vec![0.0, 0.0],
            vec![3.0, 4.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_retrieve_sorted_ascending() {
        let hits = index().retrieve(&[0.0, 0.0], 4).unwrap();
        let order: Vec<usize> = hits.iter().map(|c| c.record_index).collect();
        assert_eq!(order, vec![0, 2, 3, 1]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_retrieve_truncates_to_k() {
        let hits = index().retrieve(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_k_larger_than_catalog() {
        let hits = index().retrieve(&[0.0, 0.0], 100).unwrap();
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = index().retrieve(&[0.0, 0.0, 0.0], 4).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch { expected: 2, actual: 3 }
        ));
    }

    #[test]
    fn test_ragged_vectors_rejected() {
        assert!(FlatIndex::from_vectors(vec![vec![0.0, 1.0], vec![1.0]]).is_err());
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let empty = FlatIndex::default();
        assert!(empty.is_empty());
        assert!(empty.retrieve(&[1.0], 10).unwrap().is_empty());
    }
}
