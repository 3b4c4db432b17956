
use crate::Result;
use crate::embeddings::Embedder;

const NGRAM_SIZE: usize = 3;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic offline embedder based on hashed character trigrams.
///
/// Each trigram of the lowercased, whitespace-normalized text is hashed
/// into one of `dimension` buckets and the resulting count vector is
/// L2-normalized. Not a semantic model, but it satisfies the embedding
/// contract (fixed dimension, bitwise-deterministic) without any external
/// service, which makes it suitable for air-gapped deployments and for the
/// test suite.
#[derive(Debug, Clone)]
pub struct CharNgramEmbedder {
    dimension: usize,
}

impl CharNgramEmbedder {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Embedder for CharNgramEmbedder {
    #[inline]
    fn model_id(&self) -> String {
        format!("char-ngram/{}d", self.dimension)
    }

    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        let normalized: Vec<char> = text
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .collect();

        if normalized.len() >= NGRAM_SIZE {
            for window in normalized.windows(NGRAM_SIZE) {
                let bucket = (fnv1a(window) % self.dimension as u64) as usize;
                vector[bucket] += 1.0;
            }
        } else if !normalized.is_empty() {
            let bucket = (fnv1a(&normalized) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        Ok(vector)
    }
}

// FNV-1a over the chars' code points. The std hasher is seeded per process,
// which would break cross-process determinism of the persisted index.
fn fnv1a(chars: &[char]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &c in chars {
        for byte in (c as u32).to_le_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}
