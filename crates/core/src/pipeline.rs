use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::cluster::{Clusterer, Hdbscan};
use crate::config::GroupingConfig;
use crate::context::contextualize;
use crate::embedding::{embed_normalized, Embedder, HashEmbedder};
use crate::error::{Result, SlideError};
use crate::grouper::group_contiguous_pages;
use crate::loader::load_page_texts;
use crate::page::{PageGroups, PageNumber, PageTexts};

/// Everything one grouping run produced, stage by stage.
#[derive(Debug, Clone)]
pub struct GroupingReport {
    pub pages: Vec<PageNumber>,
    pub texts: PageTexts,
    pub contextualized: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub labels: Vec<i32>,
    pub groups: PageGroups,
}

/// Load, contextualize, embed, cluster, group. Each stage consumes the
/// previous one whole; the first failure ends the run.
pub struct PageGrouper<E, C> {
    config: GroupingConfig,
    embedder: E,
    clusterer: C,
    deadline: Option<Instant>,
}

impl PageGrouper<HashEmbedder, Hdbscan> {
    /// Offline grouper with the hashing embedder and HDBSCAN.
    pub fn offline(config: GroupingConfig) -> Result<Self> {
        let clusterer = Hdbscan::from_config(&config);
        Self::new(config, HashEmbedder::default(), clusterer)
    }
}

impl<E: Embedder, C: Clusterer> PageGrouper<E, C> {
    pub fn new(config: GroupingConfig, embedder: E, clusterer: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            embedder,
            clusterer,
            deadline: None,
        })
    }

    /// Abort between stages once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    pub fn run(&self, markdown_dir: &Path) -> Result<PageGroups> {
        self.run_detailed(markdown_dir).map(|report| report.groups)
    }

    pub fn run_detailed(&self, markdown_dir: &Path) -> Result<GroupingReport> {
        self.check_deadline("load")?;
        let texts = load_page_texts(
            markdown_dir,
            &self.config.page_name,
            self.config.lines_to_consider,
        )?;
        if texts.is_empty() {
            return Err(SlideError::NoPages(markdown_dir.to_path_buf()));
        }
        if self.config.require_contiguous_pages {
            let missing = texts.missing_pages();
            if !missing.is_empty() {
                return Err(SlideError::MissingPages(missing));
            }
        }
        info!(pages = texts.len(), dir = %markdown_dir.display(), "loaded page texts");
        self.group_texts(texts)
    }

    /// Runs every stage after loading on texts already in memory.
    pub fn group_texts(&self, texts: PageTexts) -> Result<GroupingReport> {
        self.check_deadline("contextualize")?;
        let pages = texts.pages();
        let contextualized = contextualize(&texts.texts(), self.config.window);

        self.check_deadline("embed")?;
        let embeddings = embed_normalized(&self.embedder, &contextualized)?;
        info!(
            vectors = embeddings.len(),
            dims = embeddings.first().map(Vec::len).unwrap_or(0),
            "embedded pages"
        );

        self.check_deadline("cluster")?;
        let labels = self.clusterer.cluster(&embeddings)?;
        if labels.len() != embeddings.len() {
            return Err(SlideError::Clustering(format!(
                "clusterer returned {} labels for {} vectors",
                labels.len(),
                embeddings.len()
            )));
        }

        self.check_deadline("group")?;
        let groups = group_contiguous_pages(&labels, &pages)?;
        info!(groups = groups.len(), pages = pages.len(), "grouped pages");
        Ok(GroupingReport {
            pages,
            texts,
            contextualized,
            embeddings,
            labels,
            groups,
        })
    }

    fn check_deadline(&self, stage: &'static str) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SlideError::Deadline(stage)),
            _ => Ok(()),
        }
    }
}
