use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, SlideError};
use crate::page::{PageNameFormat, PageNumber};

/// Writes the text layer of every PDF page to its own file under `out_dir`,
/// named by `format`. Layout is not reconstructed; the loader only needs
/// the first lines of each slide.
pub fn extract_pdf_pages(pdf: &Path, out_dir: &Path, format: &PageNameFormat) -> Result<Vec<PathBuf>> {
    let pages = pdf_extract::extract_text_by_pages(pdf).map_err(|e| SlideError::Extract {
        path: pdf.to_path_buf(),
        message: e.to_string(),
    })?;
    let written = write_pages(&pages, out_dir, format)?;
    info!(pages = written.len(), pdf = %pdf.display(), "extracted page texts");
    Ok(written)
}

/// Writes `pages[i]` as page `i + 1`, trimming the blank lines PDF text
/// layers tend to start with.
pub fn write_pages<S: AsRef<str>>(
    pages: &[S],
    out_dir: &Path,
    format: &PageNameFormat,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|err| SlideError::write(out_dir, err))?;
    let mut written = Vec::with_capacity(pages.len());
    for (idx, text) in pages.iter().enumerate() {
        let page = PageNumber::from_index(idx).ok_or_else(|| SlideError::Extract {
            path: out_dir.to_path_buf(),
            message: format!("page {} is out of range", idx + 1),
        })?;
        let path = out_dir.join(format.file_name(page));
        let body = text.as_ref().trim_start_matches(['\n', '\r']);
        fs::write(&path, body).map_err(|err| SlideError::write(&path, err))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_page_texts;

    #[test]
    fn written_pages_load_back_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("markdowns");
        let format = PageNameFormat::default();
        let written = write_pages(&["\n\nIntro\nAgenda", "Details"], &out, &format).unwrap();
        assert!(written[0].ends_with("page-01.md"));
        let texts = load_page_texts(&out, &format, 1).unwrap();
        assert_eq!(texts.texts(), vec!["Intro\n".to_string(), "Details".to_string()]);
    }

    #[test]
    fn unreadable_pdf_is_an_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = extract_pdf_pages(
            &tmp.path().join("missing.pdf"),
            tmp.path(),
            &PageNameFormat::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SlideError::Extract { .. }));
    }
}
