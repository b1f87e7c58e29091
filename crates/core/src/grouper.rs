use crate::error::{Result, SlideError};
use crate::page::{PageGroups, PageNumber};

/// Splits the label sequence into maximal runs of equal neighbouring
/// labels. Label `i` belongs to page `i + 1`.
///
/// Only adjacency matters: a label that reappears later opens a new group,
/// and the noise label is handled like any other value. Labels past the
/// last representable page number are ignored.
///
/// ```
/// use slidemap_core::group_contiguous;
///
/// let groups = group_contiguous(&[1, 1, 2, 2, 1]);
/// assert_eq!(groups.get(0).unwrap().len(), 2);
/// assert_eq!(groups.len(), 3);
/// ```
pub fn group_contiguous(labels: &[i32]) -> PageGroups {
    let mut groups = PageGroups::new();
    for (idx, label) in labels.iter().enumerate() {
        let Some(page) = PageNumber::from_index(idx) else {
            break;
        };
        if idx > 0 && labels[idx - 1] == *label {
            groups.extend_last(page);
        } else {
            groups.start_group(page);
        }
    }
    groups
}

/// Same runs as [`group_contiguous`], reported with the page numbers the
/// labels were computed for rather than their positions. A missing page
/// also ends a run, so no group spans a gap.
pub fn group_contiguous_pages(labels: &[i32], pages: &[PageNumber]) -> Result<PageGroups> {
    if labels.len() != pages.len() {
        return Err(SlideError::Clustering(format!(
            "{} labels for {} pages",
            labels.len(),
            pages.len()
        )));
    }
    let mut groups = PageGroups::new();
    for (idx, (label, page)) in labels.iter().zip(pages).enumerate() {
        let continues = idx > 0
            && labels[idx - 1] == *label
            && pages[idx - 1].get().checked_add(1) == Some(page.get());
        if continues {
            groups.extend_last(*page);
        } else {
            groups.start_group(*page);
        }
    }
    Ok(groups)
}
