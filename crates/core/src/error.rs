use std::path::PathBuf;

use thiserror::Error;

use crate::page::PageNumber;

/// Coarse failure class of a [`SlideError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source directory or page files are missing, unreadable or misnamed.
    Input,
    /// Configuration rejected before any I/O happened.
    Config,
    /// The embedding or clustering backend failed or broke its contract.
    Dependency,
    /// The caller's deadline passed between two stages.
    Deadline,
}

#[derive(Error, Debug)]
pub enum SlideError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot derive a page number from file name {0:?}")]
    PageName(String),
    #[error("page {page} is provided by both {first:?} and {second:?}")]
    DuplicatePage {
        page: PageNumber,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("pages are not contiguous, missing: {0:?}")]
    MissingPages(Vec<PageNumber>),
    #[error("markdown and image pages differ (markdown only: {markdown_only:?}, image only: {image_only:?})")]
    BundleMismatch {
        markdown_only: Vec<PageNumber>,
        image_only: Vec<PageNumber>,
    },
    #[error("no page files found in {0:?}")]
    NoPages(PathBuf),
    #[error("pdf extraction failed for {path:?}: {message}")]
    Extract { path: PathBuf, message: String },
    #[error("invalid config: {0}")]
    Config(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("clustering failed: {0}")]
    Clustering(String),
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("deadline exceeded before stage {0}")]
    Deadline(&'static str),
}

impl SlideError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlideError::Read { .. }
            | SlideError::Write { .. }
            | SlideError::PageName(_)
            | SlideError::DuplicatePage { .. }
            | SlideError::MissingPages(_)
            | SlideError::BundleMismatch { .. }
            | SlideError::NoPages(_)
            | SlideError::Extract { .. } => ErrorKind::Input,
            SlideError::Config(_) => ErrorKind::Config,
            SlideError::Embedding(_) | SlideError::Clustering(_) | SlideError::SerdeJson(_) => {
                ErrorKind::Dependency
            }
            SlideError::Deadline(_) => ErrorKind::Deadline,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SlideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            SlideError::PageName("x.md".into()).kind(),
            ErrorKind::Input
        );
        assert_eq!(SlideError::Config("bad".into()).kind(), ErrorKind::Config);
        assert_eq!(
            SlideError::Clustering("boom".into()).kind(),
            ErrorKind::Dependency
        );
        assert_eq!(SlideError::Deadline("embed").kind(), ErrorKind::Deadline);
    }

    #[test]
    fn read_error_keeps_path() {
        let err = SlideError::read(
            "/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/missing"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
