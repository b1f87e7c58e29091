//! Semantic slide grouping: read the top of every page, fold in
//! neighbouring pages, embed, cluster by density, and cut the deck into
//! runs of consecutive pages that landed in the same cluster.

mod bundle;
mod cluster;
mod config;
mod context;
mod embedding;
mod error;
mod extract;
mod grouper;
mod loader;
mod page;
mod pipeline;

pub use bundle::{build_bundles, SlideBundle, IMAGE_EXTENSION};
pub use cluster::{Clusterer, Hdbscan, HdbscanParams, NOISE};
pub use config::{
    GroupingConfig, DEFAULT_LINES_TO_CONSIDER, DEFAULT_MIN_CLUSTER_SIZE, DEFAULT_MIN_SAMPLES,
    DEFAULT_WINDOW,
};
pub use context::contextualize;
pub use embedding::{embed_normalized, normalize, Embedder, HashEmbedder, HashEmbedderConfig};
pub use error::{ErrorKind, Result, SlideError};
pub use extract::{extract_pdf_pages, write_pages};
pub use grouper::{group_contiguous, group_contiguous_pages};
pub use loader::{discover_pages, load_page_texts, read_first_lines};
pub use page::{PageGroups, PageNameFormat, PageNumber, PageTexts};
pub use pipeline::{GroupingReport, PageGrouper};
