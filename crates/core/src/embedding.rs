use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{Result, SlideError};

/// Maps texts to fixed-dimension vectors, one per input, in input order.
///
/// Implementations may be remote; [`embed_normalized`] checks their output
/// before anything downstream relies on it.
pub trait Embedder {
    fn dimensions(&self) -> usize;

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }
}

/// Embeds `texts` and returns unit-length vectors aligned with the input.
///
/// Fails when the backend returns the wrong number of vectors, vectors of
/// differing dimension, or non-finite values. Zero vectors stay zero.
pub fn embed_normalized<E: Embedder + ?Sized>(embedder: &E, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let mut vectors = embedder.embed(texts)?;
    if vectors.len() != texts.len() {
        return Err(SlideError::Embedding(format!(
            "backend returned {} vectors for {} inputs",
            vectors.len(),
            texts.len()
        )));
    }
    let dims = vectors[0].len();
    if dims == 0 {
        return Err(SlideError::Embedding("backend returned empty vectors".to_string()));
    }
    for (idx, vector) in vectors.iter_mut().enumerate() {
        if vector.len() != dims {
            return Err(SlideError::Embedding(format!(
                "vector {idx} has {} dimensions, expected {dims}",
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(SlideError::Embedding(format!(
                "vector {idx} contains non-finite values"
            )));
        }
        normalize(vector);
    }
    Ok(vectors)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashEmbedderConfig {
    pub dimensions: usize,
    pub seed: u64,
}

impl Default for HashEmbedderConfig {
    fn default() -> Self {
        Self {
            dimensions: 256,
            seed: 1337,
        }
    }
}

/// Offline feature-hashing embedder over words and character trigrams.
/// Deterministic, language agnostic, and good enough to tell slides that
/// share vocabulary from slides that do not.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    config: HashEmbedderConfig,
}

impl HashEmbedder {
    pub fn new(config: HashEmbedderConfig) -> Self {
        Self { config }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let dims = self.config.dimensions.max(1);
        let mut vector = vec![0f32; dims];
        for token in tokens(text) {
            vector[self.bucket_for(&token)] += 1.0;
            let chars: Vec<char> = token.chars().collect();
            if chars.len() > 3 {
                for gram in chars.windows(3) {
                    let gram: String = gram.iter().collect();
                    vector[self.bucket_for(&gram)] += 0.5;
                }
            }
        }
        normalize(&mut vector);
        vector
    }

    fn bucket_for(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        hasher.write_u64(self.config.seed);
        token.hash(&mut hasher);
        (hasher.finish() as usize) % self.config.dimensions.max(1)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(HashEmbedderConfig::default())
    }
}

impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.config.dimensions.max(1)
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
}

pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Vec<f32>>);

    impl Embedder for Fixed {
        fn dimensions(&self) -> usize {
            self.0.first().map(Vec::len).unwrap_or(0)
        }

        fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(self.0.clone())
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn hash_vectors_are_unit_length() {
        let embedder = HashEmbedder::default();
        let out = embed_normalized(&embedder, &strings(&["Lineare Algebra", "Matrizen"])).unwrap();
        assert_eq!(out.len(), 2);
        for v in &out {
            assert_eq!(v.len(), 256);
            assert!((norm(v) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn shared_vocabulary_is_closer() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed_text("gradient descent learning rate");
        let b = embedder.embed_text("gradient descent momentum");
        let c = embedder.embed_text("medieval castle architecture");
        let dot = |x: &[f32], y: &[f32]| x.iter().zip(y).map(|(p, q)| p * q).sum::<f32>();
        assert!(dot(&a, &b) > dot(&a, &c));
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let v = HashEmbedder::default().embed_text("  ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn backend_output_is_normalized() {
        let backend = Fixed(vec![vec![3.0, 4.0], vec![0.0, 2.0]]);
        let out = embed_normalized(&backend, &strings(&["x", "y"])).unwrap();
        assert_eq!(out, vec![vec![0.6, 0.8], vec![0.0, 1.0]]);
    }

    #[test]
    fn wrong_vector_count_is_rejected() {
        let backend = Fixed(vec![vec![1.0, 0.0]]);
        let err = embed_normalized(&backend, &strings(&["x", "y"])).unwrap_err();
        assert!(matches!(err, SlideError::Embedding(_)));
    }

    #[test]
    fn ragged_vectors_are_rejected() {
        let backend = Fixed(vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(embed_normalized(&backend, &strings(&["x", "y"])).is_err());
    }

    #[test]
    fn empty_input_skips_the_backend() {
        let backend = Fixed(vec![vec![1.0]]);
        assert!(embed_normalized(&backend, &[]).unwrap().is_empty());
    }
}
