use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, SlideError};
use crate::loader::discover_pages;
use crate::page::{PageNameFormat, PageNumber};

pub const IMAGE_EXTENSION: &str = "png";

/// Markdown text and, when rendered, the image of one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideBundle {
    pub page: PageNumber,
    pub slide_id: String,
    pub markdown_path: PathBuf,
    pub image_path: Option<PathBuf>,
}

/// Pairs `page-NN.md` with `page-NN.png` by page number.
///
/// With an image directory the two page sets must match exactly; pages
/// present on only one side are reported instead of being paired by
/// listing order.
pub fn build_bundles(
    markdown_dir: &Path,
    image_dir: Option<&Path>,
    format: &PageNameFormat,
) -> Result<Vec<SlideBundle>> {
    let markdown = index_pages(markdown_dir, format)?;
    if markdown.is_empty() {
        return Err(SlideError::NoPages(markdown_dir.to_path_buf()));
    }
    let images = match image_dir {
        Some(dir) => {
            let images = index_pages(dir, &format.with_extension(IMAGE_EXTENSION))?;
            let markdown_only: Vec<PageNumber> = markdown
                .keys()
                .filter(|page| !images.contains_key(page))
                .copied()
                .collect();
            let image_only: Vec<PageNumber> = images
                .keys()
                .filter(|page| !markdown.contains_key(page))
                .copied()
                .collect();
            if !markdown_only.is_empty() || !image_only.is_empty() {
                return Err(SlideError::BundleMismatch {
                    markdown_only,
                    image_only,
                });
            }
            images
        }
        None => BTreeMap::new(),
    };
    Ok(markdown
        .into_iter()
        .map(|(page, markdown_path)| SlideBundle {
            page,
            slide_id: format.slide_id(page),
            image_path: images.get(&page).cloned(),
            markdown_path,
        })
        .collect())
}

fn index_pages(dir: &Path, format: &PageNameFormat) -> Result<BTreeMap<PageNumber, PathBuf>> {
    let mut out = BTreeMap::new();
    for (page, path) in discover_pages(dir, format)? {
        if let Some(first) = out.insert(page, path.clone()) {
            return Err(SlideError::DuplicatePage {
                page,
                first,
                second: path,
            });
        }
    }
    Ok(out)
}
