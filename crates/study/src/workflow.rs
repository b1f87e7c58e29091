use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use slidemap_core::{PageGroups, SlideBundle};
use slidemap_llm::{LlmRequest, LlmResponse};

use crate::mindmap::MindMap;
use crate::notes::{bundles_by_page, group_request, GroupNote};
use crate::prompts;
use crate::reply::strip_code_fence;

pub const LLM_MAX_RETRIES: u32 = 3;
pub const DEFAULT_LANG: &str = "de";

#[derive(Debug, Clone)]
pub struct StudyOptions {
    /// Language code of the generated material.
    pub lang: String,
    /// Pause before every model call after the first.
    pub throttle_ms: u64,
    /// Attempt `n` waits `n * retry_backoff` before trying again.
    pub retry_backoff: Duration,
}

impl Default for StudyOptions {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            throttle_ms: 0,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

/// Output locations of one study run below a single root directory.
#[derive(Debug, Clone)]
pub struct StudyOutputs {
    root: PathBuf,
}

impl StudyOutputs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.root.join("notes")
    }

    pub fn note_path(&self, group: usize) -> PathBuf {
        self.notes_dir().join(format!("group-{group:02}.json"))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join("summary.md")
    }

    pub fn mind_map_path(&self) -> PathBuf {
        self.root.join("nodes_edges.json")
    }

    pub fn dot_path(&self) -> PathBuf {
        self.root.join("mindmap.dot")
    }

    /// Deletes everything a previous run wrote. Other files under the root
    /// are left alone.
    pub fn reset(&self) -> Result<()> {
        let notes = self.notes_dir();
        if notes.exists() {
            fs::remove_dir_all(&notes)
                .with_context(|| format!("failed to remove {}", notes.display()))?;
        }
        for path in [self.summary_path(), self.mind_map_path(), self.dot_path()] {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StudyReport {
    pub notes: Vec<GroupNote>,
    pub summary: String,
    pub mind_map: MindMap,
    pub llm_calls: usize,
    pub total_tokens: u64,
}

/// Runs group notes, lecture summary and mind map in that order, writing
/// each artifact as soon as it exists. `invoke` performs one model call.
pub fn run_study<F>(
    groups: &PageGroups,
    bundles: &[SlideBundle],
    options: &StudyOptions,
    outputs: &StudyOutputs,
    invoke: F,
) -> Result<StudyReport>
where
    F: Fn(&LlmRequest) -> Result<LlmResponse>,
{
    let mut caller = Caller {
        invoke,
        options,
        calls: 0,
        tokens: 0,
    };
    let index = bundles_by_page(bundles);
    fs::create_dir_all(outputs.notes_dir())
        .with_context(|| format!("failed to create {}", outputs.notes_dir().display()))?;

    info!(stage = "notes", groups = groups.len(), "writing group notes");
    let mut notes = Vec::with_capacity(groups.len());
    for (group, pages) in groups.iter() {
        let request = group_request(group, pages, &index, &options.lang)?;
        let label = format!("group {group}");
        let mut note = caller.call(&request, &label, GroupNote::parse)?;
        if note.slide_ids.is_empty() {
            note.slide_ids = pages
                .iter()
                .filter_map(|page| index.get(page).map(|b| b.slide_id.clone()))
                .collect();
        }
        write_json(&outputs.note_path(group), &note)?;
        notes.push(note);
    }

    info!(stage = "summary", notes = notes.len(), "writing lecture summary");
    let notes_json = serde_json::to_string_pretty(&notes)?;
    let request = LlmRequest {
        system: Some(prompts::summary_system(&options.lang)),
        user: prompts::summary_user(&notes_json),
        images: Vec::new(),
        temperature: Some(0.5),
    };
    let summary = caller.call(&request, "summary", |raw| {
        Ok(format!("{}\n", strip_code_fence(raw)))
    })?;
    write_text(&outputs.summary_path(), &summary)?;

    info!(stage = "mindmap", "deriving mind map");
    let request = LlmRequest {
        system: Some(prompts::mind_map_system(&options.lang)),
        user: prompts::mind_map_user(&summary),
        images: Vec::new(),
        temperature: Some(0.2),
    };
    let mind_map = caller.call(&request, "mind map", MindMap::parse)?;
    write_json(&outputs.mind_map_path(), &mind_map)?;
    write_text(&outputs.dot_path(), &mind_map.to_dot())?;
    info!(
        nodes = mind_map.nodes.len(),
        edges = mind_map.edges.len(),
        calls = caller.calls,
        "study material written to {}",
        outputs.root().display()
    );

    Ok(StudyReport {
        notes,
        summary,
        mind_map,
        llm_calls: caller.calls,
        total_tokens: caller.tokens,
    })
}

struct Caller<'a, F> {
    invoke: F,
    options: &'a StudyOptions,
    calls: usize,
    tokens: u64,
}

impl<F> Caller<'_, F>
where
    F: Fn(&LlmRequest) -> Result<LlmResponse>,
{
    /// One model call plus reply parsing, retried together so a malformed
    /// reply gets another attempt as well.
    fn call<T>(
        &mut self,
        request: &LlmRequest,
        label: &str,
        parse: impl Fn(&str) -> Result<T>,
    ) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            if self.calls > 0 {
                throttle_llm(self.options.throttle_ms);
            }
            self.calls += 1;
            let outcome = (self.invoke)(request).and_then(|response| {
                self.tokens += u64::from(response.total_tokens());
                parse(&response.content)
            });
            match outcome {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!("LLM call failed for {label} (attempt {attempt}/{LLM_MAX_RETRIES}): {err:#}");
                    if attempt >= LLM_MAX_RETRIES {
                        return Err(err.context(format!("{label} failed after {attempt} attempts")));
                    }
                    thread::sleep(self.options.retry_backoff * attempt);
                }
            }
        }
    }
}

fn throttle_llm(delay_ms: u64) {
    if delay_ms > 0 {
        thread::sleep(Duration::from_millis(delay_ms));
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    write_text(path, &text)
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}
