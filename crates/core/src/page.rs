use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlideError};

/// 1-based slide number. Zero is not a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageNumber(u32);

impl PageNumber {
    pub fn new(value: u32) -> Option<Self> {
        (value >= 1).then_some(Self(value))
    }

    /// Page number of the 0-based position `index` in a deck, or `None`
    /// past the last representable page.
    pub fn from_index(index: usize) -> Option<Self> {
        let value = u32::try_from(index).ok()?.checked_add(1)?;
        Some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Naming contract shared with whatever writes the per-page files:
/// `{prefix}{page, zero padded to width}.{extension}`, e.g. `page-07.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageNameFormat {
    pub prefix: String,
    pub width: usize,
    pub extension: String,
}

impl Default for PageNameFormat {
    fn default() -> Self {
        Self {
            prefix: "page-".to_string(),
            width: 2,
            extension: "md".to_string(),
        }
    }
}

impl PageNameFormat {
    pub fn with_extension(&self, extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
            ..self.clone()
        }
    }

    pub fn file_name(&self, page: PageNumber) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            page.get(),
            self.extension,
            width = self.width
        )
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// Parses a file name written under this format. At least `width`
    /// digits must follow the prefix; longer runs are accepted so decks
    /// past the padded range still load.
    pub fn parse(&self, file_name: &str) -> Result<PageNumber> {
        let bad = || SlideError::PageName(file_name.to_string());
        let rest = file_name.strip_prefix(&self.prefix).ok_or_else(bad)?;
        let (digits, extension) = rest.rsplit_once('.').ok_or_else(bad)?;
        if !extension.eq_ignore_ascii_case(&self.extension) {
            return Err(bad());
        }
        if digits.len() < self.width || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let value: u32 = digits.parse().map_err(|_| bad())?;
        PageNumber::new(value).ok_or_else(bad)
    }

    /// Stem of the file for `page`, used as the slide id in notes.
    pub fn slide_id(&self, page: PageNumber) -> String {
        format!("{}{:0width$}", self.prefix, page.get(), width = self.width)
    }
}

/// Short text excerpt per page, ordered by page number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTexts {
    entries: BTreeMap<PageNumber, String>,
}

impl PageTexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text previously stored for `page`, if any.
    pub fn insert(&mut self, page: PageNumber, text: String) -> Option<String> {
        self.entries.insert(page, text)
    }

    pub fn get(&self, page: PageNumber) -> Option<&str> {
        self.entries.get(&page).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pages(&self) -> Vec<PageNumber> {
        self.entries.keys().copied().collect()
    }

    /// Texts in ascending page order, independent of load order.
    pub fn texts(&self) -> Vec<String> {
        self.entries.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PageNumber, &str)> {
        self.entries.iter().map(|(page, text)| (*page, text.as_str()))
    }

    /// Pages between 1 and the highest loaded page that have no text.
    pub fn missing_pages(&self) -> Vec<PageNumber> {
        let Some(last) = self.entries.keys().next_back() else {
            return Vec::new();
        };
        (1..=last.get())
            .filter_map(PageNumber::new)
            .filter(|page| !self.entries.contains_key(page))
            .collect()
    }

    pub fn is_contiguous(&self) -> bool {
        self.missing_pages().is_empty()
    }
}

impl FromIterator<(PageNumber, String)> for PageTexts {
    fn from_iter<I: IntoIterator<Item = (PageNumber, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Consecutive runs of pages sharing a cluster label, keyed by the
/// 0-based order in which the runs were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageGroups {
    groups: BTreeMap<usize, Vec<PageNumber>>,
}

impl PageGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start_group(&mut self, page: PageNumber) {
        let index = self.groups.len();
        self.groups.insert(index, vec![page]);
    }

    pub(crate) fn extend_last(&mut self, page: PageNumber) {
        match self.groups.values_mut().next_back() {
            Some(last) => last.push(page),
            None => self.start_group(page),
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[PageNumber]> {
        self.groups.get(&index).map(Vec::as_slice)
    }

    /// Groups in ascending index order; pages inside a group ascend.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[PageNumber])> {
        self.groups
            .iter()
            .map(|(index, pages)| (*index, pages.as_slice()))
    }

    pub fn page_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Plain `index -> [page, ...]` view with raw page numbers.
    pub fn to_map(&self) -> BTreeMap<usize, Vec<u32>> {
        self.groups
            .iter()
            .map(|(index, pages)| (*index, pages.iter().map(|p| p.get()).collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32) -> PageNumber {
        PageNumber::new(n).unwrap()
    }

    #[test]
    fn page_zero_is_rejected() {
        assert!(PageNumber::new(0).is_none());
        assert_eq!(PageNumber::from_index(0).unwrap().get(), 1);
    }

    #[test]
    fn index_past_the_last_page_has_no_number() {
        assert_eq!(PageNumber::from_index(u32::MAX as usize - 1).unwrap().get(), u32::MAX);
        assert!(PageNumber::from_index(u32::MAX as usize).is_none());
    }

    #[test]
    fn default_format_matches_converter_names() {
        let format = PageNameFormat::default();
        assert_eq!(format.file_name(page(7)), "page-07.md");
        assert_eq!(format.parse("page-07.md").unwrap(), page(7));
        assert_eq!(format.parse("page-123.md").unwrap(), page(123));
        assert_eq!(format.slide_id(page(3)), "page-03");
    }

    #[test]
    fn malformed_names_are_rejected() {
        let format = PageNameFormat::default();
        for name in ["page-7.md", "page-00.md", "slide-01.md", "page-0a.md", "page-01.png", "page-01"] {
            assert!(format.parse(name).is_err(), "{name} should not parse");
        }
    }

    #[test]
    fn texts_come_back_in_page_order() {
        let texts: PageTexts = vec![
            (page(3), "c".to_string()),
            (page(1), "a".to_string()),
            (page(2), "b".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(texts.texts(), vec!["a", "b", "c"]);
        assert!(texts.is_contiguous());
    }

    #[test]
    fn missing_pages_are_reported() {
        let texts: PageTexts = vec![(page(1), String::new()), (page(4), String::new())]
            .into_iter()
            .collect();
        assert_eq!(texts.missing_pages(), vec![page(2), page(3)]);
    }

    #[test]
    fn groups_serialize_with_string_keys() {
        let mut groups = PageGroups::new();
        groups.start_group(page(1));
        groups.extend_last(page(2));
        groups.start_group(page(3));
        let json = serde_json::to_string(&groups).unwrap();
        assert_eq!(json, r#"{"0":[1,2],"1":[3]}"#);
        let back: PageGroups = serde_json::from_str(&json).unwrap();
        assert_eq!(back, groups);
    }
}
