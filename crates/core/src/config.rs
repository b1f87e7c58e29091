use serde::{Deserialize, Serialize};

use crate::error::{Result, SlideError};
use crate::page::PageNameFormat;

pub const DEFAULT_LINES_TO_CONSIDER: usize = 3;
pub const DEFAULT_WINDOW: usize = 1;
pub const DEFAULT_MIN_SAMPLES: usize = 2;
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 2;

/// Tunables of one grouping run. Deserializes from a `[grouping]` table;
/// every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Lines read from the top of every page file.
    pub lines_to_consider: usize,
    /// Neighbour distance folded into each page's context.
    pub window: usize,
    pub min_samples: usize,
    pub min_cluster_size: usize,
    pub page_name: PageNameFormat,
    /// Fail when page numbers have gaps instead of grouping what exists.
    pub require_contiguous_pages: bool,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            lines_to_consider: DEFAULT_LINES_TO_CONSIDER,
            window: DEFAULT_WINDOW,
            min_samples: DEFAULT_MIN_SAMPLES,
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            page_name: PageNameFormat::default(),
            require_contiguous_pages: false,
        }
    }
}

impl GroupingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lines_to_consider < 1 {
            return Err(SlideError::Config(
                "lines_to_consider must be at least 1".to_string(),
            ));
        }
        if self.min_samples < 1 {
            return Err(SlideError::Config(
                "min_samples must be at least 1".to_string(),
            ));
        }
        if self.min_cluster_size < 2 {
            return Err(SlideError::Config(
                "min_cluster_size must be at least 2".to_string(),
            ));
        }
        if self.page_name.width < 1 {
            return Err(SlideError::Config(
                "page_name.width must be at least 1".to_string(),
            ));
        }
        if self.page_name.extension.trim().is_empty() {
            return Err(SlideError::Config(
                "page_name.extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
