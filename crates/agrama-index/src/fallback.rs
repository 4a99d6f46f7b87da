//! Deterministic statistical fallback embedder.
//!
//! Keeps the engine fully functional with no external model: byte-class
//! frequency buckets capture coarse lexical shape, a few length features
//! capture scale, and the remaining dimensions carry low-amplitude noise
//! seeded from the content hash so distinct texts don't collapse onto the
//! same point. Output is deterministic and unit-normalized.

use agrama_core::errors::AgramaResult;
use agrama_core::traits::EmbeddingProvider;

use crate::simd;

/// How many leading dimensions hold byte-frequency buckets.
const FREQUENCY_BUCKETS: usize = 48;
/// Dimensions after the buckets holding length/shape features.
const LENGTH_FEATURES: usize = 4;
/// Amplitude of the hash-seeded noise tail relative to the signal part.
const NOISE_AMPLITUDE: f32 = 0.05;

/// Always-available embedding provider with no model dependencies.
pub struct StatisticalEmbedder {
    dimensions: usize,
}

impl StatisticalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        let bytes = text.as_bytes();
        let buckets = FREQUENCY_BUCKETS.min(self.dimensions);

        // Byte-class frequencies.
        if !bytes.is_empty() && buckets > 0 {
            for &b in bytes {
                let bucket = (b as usize).wrapping_mul(0x9e37) % buckets;
                v[bucket] += 1.0;
            }
            let inv = 1.0 / bytes.len() as f32;
            for x in &mut v[..buckets] {
                *x *= inv;
            }
        }

        // Length and shape features.
        let feature_base = buckets;
        let features = LENGTH_FEATURES.min(self.dimensions.saturating_sub(feature_base));
        if features > 0 {
            let words = text.split_whitespace().count() as f32;
            let lines = text.lines().count() as f32;
            let feats = [
                (bytes.len() as f32).ln_1p() * 0.1,
                words.ln_1p() * 0.1,
                lines.ln_1p() * 0.1,
                text.chars().filter(|c| c.is_alphabetic()).count() as f32
                    / bytes.len().max(1) as f32,
            ];
            v[feature_base..feature_base + features].copy_from_slice(&feats[..features]);
        }

        // Content-hash-seeded noise tail: a cheap xorshift stream keyed by
        // blake3 of the text fills the remaining dimensions.
        let noise_base = feature_base + features;
        if noise_base < self.dimensions {
            let hash = blake3::hash(bytes);
            let mut state = u64::from_le_bytes(
                hash.as_bytes()[..8].try_into().unwrap_or([1u8; 8]),
            )
            .max(1);
            for x in &mut v[noise_base..] {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                // Map to [-1, 1].
                let unit = (state >> 11) as f32 / (1u64 << 53) as f32 * 2.0 - 1.0;
                *x = unit * NOISE_AMPLITUDE;
            }
        }

        simd::normalize(&mut v);
        v
    }
}

impl EmbeddingProvider for StatisticalEmbedder {
    fn embed(&self, text: &str) -> AgramaResult<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "statistical-fallback"
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let p = StatisticalEmbedder::new(256);
        assert_eq!(p.embed("same input").unwrap(), p.embed("same input").unwrap());
    }

    #[test]
    fn correct_dimensions_and_unit_norm() {
        let p = StatisticalEmbedder::new(384);
        let v = p.embed("authentication token handler").unwrap();
        assert_eq!(v.len(), 384);
        assert!((simd::norm(&v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn distinct_texts_produce_distinct_vectors() {
        let p = StatisticalEmbedder::new(128);
        let a = p.embed("first document").unwrap();
        let b = p.embed("second document").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn related_texts_score_above_unrelated() {
        let p = StatisticalEmbedder::new(256);
        let a = p.embed("authentication token handler").unwrap();
        let b = p.embed("authentication session manager").unwrap();
        let c = p.embed("zzz 0x7f3 ### qqq").unwrap();
        let ab = simd::dot(&a, &b);
        let ac = simd::dot(&a, &c);
        assert!(ab > ac, "ab={ab} ac={ac}");
    }

    #[test]
    fn empty_text_is_well_formed() {
        let p = StatisticalEmbedder::new(64);
        let v = p.embed("").unwrap();
        assert_eq!(v.len(), 64);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn batch_matches_individual() {
        let p = StatisticalEmbedder::new(128);
        let texts = vec!["one".to_string(), "two".to_string()];
        let batch = p.embed_batch(&texts).unwrap();
        assert_eq!(batch[0], p.embed("one").unwrap());
        assert_eq!(batch[1], p.embed("two").unwrap());
    }
}
