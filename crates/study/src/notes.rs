use std::collections::BTreeMap;
use std::fs;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use slidemap_core::{PageNumber, SlideBundle};
use slidemap_llm::{ImageAttachment, LlmRequest};

use crate::prompts;
use crate::reply::parse_json_reply;

/// Structured notes for one group of slides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNote {
    #[serde(default, alias = "slide_id")]
    pub slide_ids: Vec<String>,
    #[serde(default)]
    pub summary_bullets: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub uncertainties: Vec<String>,
}

impl GroupNote {
    pub fn parse(raw: &str) -> Result<Self> {
        parse_json_reply(raw, "group notes")
    }
}

/// Slide bundles indexed by page for group lookups.
pub fn bundles_by_page(bundles: &[SlideBundle]) -> BTreeMap<PageNumber, &SlideBundle> {
    bundles.iter().map(|bundle| (bundle.page, bundle)).collect()
}

/// Builds the request for one group: every slide's markdown in page order
/// plus its PNG image as a data URL when one was rendered.
pub fn group_request(
    group: usize,
    pages: &[PageNumber],
    bundles: &BTreeMap<PageNumber, &SlideBundle>,
    lang: &str,
) -> Result<LlmRequest> {
    let mut slides = Vec::with_capacity(pages.len());
    let mut images = Vec::new();
    for page in pages {
        let bundle = bundles
            .get(page)
            .ok_or_else(|| anyhow!(format!("no slide bundle for page {page}")))?;
        let markdown = fs::read_to_string(&bundle.markdown_path)
            .with_context(|| format!("failed to read {}", bundle.markdown_path.display()))?;
        slides.push((bundle.slide_id.clone(), markdown));
        if let Some(image_path) = &bundle.image_path {
            let bytes = fs::read(image_path)
                .with_context(|| format!("failed to read {}", image_path.display()))?;
            images.push(ImageAttachment::from_base64(
                "image/png",
                &general_purpose::STANDARD.encode(bytes),
            ));
        }
    }
    Ok(LlmRequest {
        system: Some(prompts::group_notes_system(lang)),
        user: prompts::group_notes_user(group, &slides),
        images,
        temperature: Some(0.5),
    })
}
