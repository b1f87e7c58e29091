//! Density-based clustering of page embeddings.
//!
//! [`Hdbscan`] hands the vectors to the `hdbscan` crate. `min_samples`
//! counts neighbours other than the point itself, so a point's core
//! distance is the distance to its `min_samples`-th nearest other point.
//! The root cluster is never selected: a deck without density structure
//! comes back as all noise.
//!
//! Labels are only meaningful for equality inside one result.

use hdbscan::{HdbscanHyperParams, NnAlgorithm};
use tracing::debug;

use crate::config::GroupingConfig;
use crate::error::{Result, SlideError};

/// Label of points that belong to no cluster.
pub const NOISE: i32 = -1;

pub trait Clusterer {
    /// One label per input vector, in input order.
    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<Vec<i32>>;
}

impl<C: Clusterer + ?Sized> Clusterer for &C {
    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<Vec<i32>> {
        (**self).cluster(vectors)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdbscanParams {
    pub min_samples: usize,
    pub min_cluster_size: usize,
}

impl Default for HdbscanParams {
    fn default() -> Self {
        Self {
            min_samples: 2,
            min_cluster_size: 2,
        }
    }
}

impl HdbscanParams {
    /// Neighbourhood size handed to the library, whose count includes the
    /// point itself. `min_samples` is capped at `n - 1` other points.
    fn neighbourhood(&self, n: usize) -> usize {
        self.min_samples.max(1).min(n.saturating_sub(1)) + 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct Hdbscan {
    params: HdbscanParams,
}

impl Hdbscan {
    pub fn new(params: HdbscanParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &GroupingConfig) -> Self {
        Self::new(HdbscanParams {
            min_samples: config.min_samples,
            min_cluster_size: config.min_cluster_size,
        })
    }

    pub fn params(&self) -> HdbscanParams {
        self.params
    }
}

impl Clusterer for Hdbscan {
    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<Vec<i32>> {
        validate_vectors(vectors)?;
        let n = vectors.len();
        let min_cluster_size = self.params.min_cluster_size.max(2);
        if n < min_cluster_size {
            return Ok(vec![NOISE; n]);
        }
        let hyper_params = HdbscanHyperParams::builder()
            .min_cluster_size(min_cluster_size)
            .min_samples(self.params.neighbourhood(n))
            .nn_algorithm(NnAlgorithm::BruteForce)
            .build();
        let labels = hdbscan::Hdbscan::new(vectors, hyper_params)
            .cluster()
            .map_err(|err| SlideError::Clustering(format!("hdbscan failed: {err:?}")))?;
        if labels.len() != n {
            return Err(SlideError::Clustering(format!(
                "hdbscan returned {} labels for {n} vectors",
                labels.len()
            )));
        }
        let clusters = labels.iter().filter(|l| **l >= 0).max().map_or(0, |m| m + 1);
        debug!(points = n, clusters, "hdbscan finished");
        Ok(labels)
    }
}

fn validate_vectors(vectors: &[Vec<f32>]) -> Result<()> {
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    let dims = first.len();
    if dims == 0 {
        return Err(SlideError::Clustering("vectors have no dimensions".to_string()));
    }
    for (idx, vector) in vectors.iter().enumerate() {
        if vector.len() != dims {
            return Err(SlideError::Clustering(format!(
                "vector {idx} has {} dimensions, expected {dims}",
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(SlideError::Clustering(format!(
                "vector {idx} contains non-finite values"
            )));
        }
    }
    Ok(())
}
