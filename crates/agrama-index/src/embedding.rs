//! Matryoshka embeddings.
//!
//! One aligned buffer holds the full vector; the configured prefix lengths
//! are usable embeddings of decreasing fidelity sharing that storage. The
//! full vector is unit-normalized on ingest; per-resolution prefix norms
//! are precomputed so truncated comparisons stay exact cosine.

use agrama_pool::AlignedVec;
use serde::{Deserialize, Serialize};

use agrama_core::errors::{AgramaResult, IndexError};

use crate::simd;

/// A dense vector with Matryoshka prefix resolutions.
#[derive(Debug, Clone)]
pub struct Embedding {
    buf: AlignedVec,
    /// (prefix length, prefix norm) for each configured resolution,
    /// ascending; the last entry is the full dimension with norm 1.
    prefix_norms: Vec<(usize, f32)>,
}

/// Shape shared by every embedding in one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingShape {
    pub dimension: usize,
    /// Ascending prefix resolutions; last equals `dimension`.
    pub resolutions: Vec<usize>,
}

impl EmbeddingShape {
    pub fn new(dimension: usize, mut resolutions: Vec<usize>) -> Self {
        resolutions.retain(|&r| r <= dimension && r > 0);
        resolutions.sort_unstable();
        resolutions.dedup();
        if resolutions.last() != Some(&dimension) {
            resolutions.push(dimension);
        }
        Self {
            dimension,
            resolutions,
        }
    }

    /// Whether `resolution` is one of the configured prefix lengths.
    pub fn supports(&self, resolution: usize) -> bool {
        self.resolutions.contains(&resolution)
    }
}

impl Embedding {
    /// Ingest a raw vector: validate its dimension, normalize to unit
    /// length, and precompute prefix norms for the shape's resolutions.
    ///
    /// # Errors
    /// `DimensionMismatch` when the input length differs from the shape.
    pub fn new(values: &[f32], shape: &EmbeddingShape) -> AgramaResult<Self> {
        if values.len() != shape.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: shape.dimension,
                actual: values.len(),
            }
            .into());
        }
        let mut buf = AlignedVec::from_slice(values);
        simd::normalize(buf.as_mut_slice());

        let prefix_norms = shape
            .resolutions
            .iter()
            .map(|&r| (r, simd::norm(&buf.as_slice()[..r])))
            .collect();

        Ok(Self { buf, prefix_norms })
    }

    pub fn dimension(&self) -> usize {
        self.buf.len()
    }

    /// The full unit-normalized vector.
    pub fn full(&self) -> &[f32] {
        self.buf.as_slice()
    }

    /// Prefix view at a configured resolution.
    pub fn prefix(&self, resolution: usize) -> &[f32] {
        &self.buf.as_slice()[..resolution.min(self.buf.len())]
    }

    /// Norm of the prefix at a configured resolution; falls back to
    /// recomputing for an unlisted length.
    pub fn prefix_norm(&self, resolution: usize) -> f32 {
        self.prefix_norms
            .iter()
            .find(|(r, _)| *r == resolution)
            .map(|(_, n)| *n)
            .unwrap_or_else(|| simd::norm(self.prefix(resolution)))
    }

    /// Cosine similarity at the given resolution.
    pub fn similarity_at(&self, other: &Embedding, resolution: usize) -> f32 {
        simd::cosine_with_norms(
            self.prefix(resolution),
            other.prefix(resolution),
            self.prefix_norm(resolution),
            other.prefix_norm(resolution),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> EmbeddingShape {
        EmbeddingShape::new(8, vec![2, 4, 8])
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let r = Embedding::new(&[1.0, 2.0], &shape());
        assert!(r.is_err());
    }

    #[test]
    fn full_vector_is_unit_normalized() {
        let e = Embedding::new(&[3.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], &shape()).unwrap();
        assert!((simd::norm(e.full()) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shape_always_includes_full_dimension() {
        let s = EmbeddingShape::new(16, vec![4, 32, 8]);
        assert_eq!(s.resolutions, vec![4, 8, 16]);
        assert!(s.supports(8));
        assert!(!s.supports(32));
    }

    #[test]
    fn prefix_similarity_is_exact_cosine() {
        let a = Embedding::new(&[1.0, 0.5, 0.0, 0.0, 9.0, 9.0, 9.0, 9.0], &shape()).unwrap();
        let b = Embedding::new(&[1.0, 0.4, 0.0, 0.0, -9.0, 9.0, -9.0, 9.0], &shape()).unwrap();

        let pa = a.prefix(2);
        let pb = b.prefix(2);
        let expected = simd::dot(pa, pb) / (simd::norm(pa) * simd::norm(pb));
        assert!((a.similarity_at(&b, 2) - expected).abs() < 1e-5);
        // High-dimension noise dominates at full resolution but not at the
        // coarse prefix.
        assert!(a.similarity_at(&b, 2) > a.similarity_at(&b, 8));
    }

    #[test]
    fn identical_vectors_have_unit_similarity_at_all_resolutions() {
        let v: Vec<f32> = (1..=8).map(|i| i as f32).collect();
        let a = Embedding::new(&v, &shape()).unwrap();
        let b = Embedding::new(&v, &shape()).unwrap();
        for r in [2, 4, 8] {
            assert!((a.similarity_at(&b, r) - 1.0).abs() < 1e-4, "resolution {r}");
        }
    }
}
