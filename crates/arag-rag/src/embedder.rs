//! Offline embedder

use async_trait::async_trait;

use arag_core::{Embedder, Result};

/// Hash-based bag-of-words embedder
///
/// Needs no network and is stable across runs, which makes it the embedder
/// of `--local` mode and of tests. Words and bigrams are hashed into buckets
/// and the vector is L2-normalised, so cosine similarity tracks word overlap.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, token: &str) -> (usize, u64) {
        let digest = md5::compute(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.0[..8]);
        let hash = u64::from_le_bytes(bytes);
        ((hash % self.dimension as u64) as usize, hash)
    }

    /// Embed synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let normalized: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
            .collect();
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let mut vector = vec![0.0f32; self.dimension];

        for word in &words {
            let (idx, hash) = self.bucket(word);
            vector[idx] += 1.0;

            if word.chars().count() > 3 {
                let secondary = ((hash >> 32) % self.dimension as u64) as usize;
                vector[secondary] += 0.5;
            }
        }

        for window in words.windows(2) {
            let (idx, _) = self.bucket(&format!("{} {}", window[0], window[1]));
            vector[idx] += 0.3;
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
