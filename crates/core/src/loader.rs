use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SlideError};
use crate::page::{PageNameFormat, PageNumber, PageTexts};

/// Reads the first `lines_to_consider` lines of every page file in `dir`.
///
/// Only files carrying the format's extension are considered; their names
/// must parse under `format`. Gaps in the page sequence are not checked
/// here, see [`PageTexts::missing_pages`].
pub fn load_page_texts(
    dir: &Path,
    format: &PageNameFormat,
    lines_to_consider: usize,
) -> Result<PageTexts> {
    let mut texts = PageTexts::new();
    let mut origins: HashMap<PageNumber, PathBuf> = HashMap::new();
    for (page, path) in discover_pages(dir, format)? {
        if let Some(first) = origins.get(&page) {
            return Err(SlideError::DuplicatePage {
                page,
                first: first.clone(),
                second: path,
            });
        }
        let text = read_first_lines(&path, lines_to_consider)?;
        debug!(page = page.get(), chars = text.len(), "loaded page excerpt");
        texts.insert(page, text);
        origins.insert(page, path);
    }
    Ok(texts)
}

/// Lists `(page, path)` for every file in `dir` matching `format`,
/// sorted by file name.
pub fn discover_pages(dir: &Path, format: &PageNameFormat) -> Result<Vec<(PageNumber, PathBuf)>> {
    let mut found = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|err| SlideError::read(dir, io::Error::from(err)))?;
        if !entry.file_type().is_file() || !format.matches_extension(entry.path()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let page = format.parse(&name)?;
        found.push((page, entry.into_path()));
    }
    Ok(found)
}

/// Reads at most `limit` lines, keeping their line terminators. Shorter
/// files are returned whole.
pub fn read_first_lines(path: &Path, limit: usize) -> Result<String> {
    let file = File::open(path).map_err(|err| SlideError::read(path, err))?;
    let mut reader = BufReader::new(file);
    let mut out = String::new();
    for _ in 0..limit {
        let read = reader
            .read_line(&mut out)
            .map_err(|err| SlideError::read(path, err))?;
        if read == 0 {
            break;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn reads_only_the_requested_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "page-01.md", "# Title\nline two\nline three\nline four\n");
        let texts = load_page_texts(tmp.path(), &PageNameFormat::default(), 3).unwrap();
        assert_eq!(
            texts.get(PageNumber::new(1).unwrap()),
            Some("# Title\nline two\nline three\n")
        );
    }

    #[test]
    fn short_files_are_read_whole() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "page-01.md", "only line");
        write(tmp.path(), "page-02.md", "");
        let texts = load_page_texts(tmp.path(), &PageNameFormat::default(), 3).unwrap();
        assert_eq!(texts.texts(), vec!["only line".to_string(), String::new()]);
    }

    #[test]
    fn foreign_extensions_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "page-01.md", "a\n");
        write(tmp.path(), ".DS_Store", "junk");
        write(tmp.path(), "page-01.png", "not text");
        let texts = load_page_texts(tmp.path(), &PageNameFormat::default(), 3).unwrap();
        assert_eq!(texts.len(), 1);
    }

    #[test]
    fn misnamed_page_file_is_an_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "slide1.md", "a\n");
        let err = load_page_texts(tmp.path(), &PageNameFormat::default(), 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn duplicate_page_numbers_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "page-01.md", "a\n");
        write(tmp.path(), "page-001.md", "b\n");
        let err = load_page_texts(tmp.path(), &PageNameFormat::default(), 3).unwrap_err();
        assert!(matches!(err, SlideError::DuplicatePage { .. }));
    }

    #[test]
    fn missing_directory_is_an_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err =
            load_page_texts(&tmp.path().join("nope"), &PageNameFormat::default(), 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }
}
