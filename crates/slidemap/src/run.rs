use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use slidemap_core::{build_bundles, PageGroups, SlideBundle};
use slidemap_llm::LlmClient;
use slidemap_study::{run_study, StudyOptions, StudyOutputs, StudyReport};

use crate::commands::group_pages;
use crate::config::AppConfig;

pub fn summarize(config: &AppConfig, clean: bool) -> Result<()> {
    let client = LlmClient::new(config.llm.provider()?, config.llm.model()?)?;
    info!(
        provider = client.provider().as_str(),
        model = client.model(),
        "using language model"
    );
    let report = run_pipeline(
        config,
        clean,
        group_pages,
        |groups, bundles, options, outputs| {
            run_study(groups, bundles, options, outputs, |request| {
                client.chat_blocking(request)
            })
        },
    )?;
    println!(
        "{} groups, {} model calls, {} tokens; results in {}",
        report.notes.len(),
        report.llm_calls,
        report.total_tokens,
        config.paths.output_dir.display()
    );
    Ok(())
}

fn run_pipeline<FGroup, FStudy>(
    config: &AppConfig,
    clean: bool,
    group_fn: FGroup,
    study_fn: FStudy,
) -> Result<StudyReport>
where
    FGroup: Fn(&AppConfig, &Path) -> Result<PageGroups>,
    FStudy: Fn(&PageGroups, &[SlideBundle], &StudyOptions, &StudyOutputs) -> Result<StudyReport>,
{
    let outputs = StudyOutputs::new(&config.paths.output_dir);
    if clean {
        info!("removing outputs of the previous run");
        outputs.reset()?;
    }
    fs::create_dir_all(outputs.root())
        .with_context(|| format!("failed to create {}", outputs.root().display()))?;

    let markdown_dir = &config.paths.markdown_dir;
    let bundles = build_bundles(
        markdown_dir,
        config.paths.image_dir.as_deref(),
        &config.grouping.page_name,
    )?;
    let groups = group_fn(config, markdown_dir)?;
    info!(slides = bundles.len(), groups = groups.len(), "slides grouped");
    let groups_path = outputs.root().join("groups.json");
    fs::write(&groups_path, serde_json::to_string_pretty(&groups)?)
        .with_context(|| format!("failed to write {}", groups_path.display()))?;

    let options = StudyOptions {
        lang: config.llm.lang.clone(),
        throttle_ms: config.llm.throttle_ms,
        retry_backoff: Duration::from_secs(2),
    };
    study_fn(&groups, &bundles, &options, &outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidemap_core::group_contiguous;
    use slidemap_study::MindMap;
    use std::cell::RefCell;
    use std::path::PathBuf;

    fn config_for(root: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.paths.markdown_dir = root.join("md");
        config.paths.output_dir = root.join("out");
        fs::create_dir_all(&config.paths.markdown_dir).unwrap();
        for page in 1..=3 {
            fs::write(
                config.paths.markdown_dir.join(format!("page-{page:02}.md")),
                format!("slide {page}"),
            )
            .unwrap();
        }
        config
    }

    fn empty_report() -> StudyReport {
        StudyReport {
            notes: Vec::new(),
            summary: String::new(),
            mind_map: MindMap::default(),
            llm_calls: 0,
            total_tokens: 0,
        }
    }

    #[test]
    fn pipeline_groups_then_studies() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config_for(tmp.path());
        config.llm.lang = "en".to_string();
        let group_calls: RefCell<Vec<PathBuf>> = RefCell::new(Vec::new());
        let study_calls: RefCell<Vec<(usize, usize, String)>> = RefCell::new(Vec::new());
        run_pipeline(
            &config,
            false,
            |_, dir| {
                group_calls.borrow_mut().push(dir.to_path_buf());
                Ok(group_contiguous(&[0, 0, 1]))
            },
            |groups, bundles, options, _| {
                study_calls
                    .borrow_mut()
                    .push((groups.len(), bundles.len(), options.lang.clone()));
                Ok(empty_report())
            },
        )
        .unwrap();
        assert_eq!(group_calls.borrow().as_slice(), &[config.paths.markdown_dir.clone()]);
        assert_eq!(study_calls.borrow().as_slice(), &[(2, 3, "en".to_string())]);
        let written = fs::read_to_string(config.paths.output_dir.join("groups.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, serde_json::json!({"0": [1, 2], "1": [3]}));
    }

    #[test]
    fn clean_removes_previous_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_for(tmp.path());
        let outputs = StudyOutputs::new(&config.paths.output_dir);
        fs::create_dir_all(outputs.root()).unwrap();
        fs::write(outputs.summary_path(), "# stale").unwrap();
        run_pipeline(
            &config,
            true,
            |_, _| Ok(group_contiguous(&[0, 0, 0])),
            |_, _, _, outputs| {
                assert!(!outputs.summary_path().exists());
                Ok(empty_report())
            },
        )
        .unwrap();
    }

    #[test]
    fn grouping_failure_skips_study() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_for(tmp.path());
        let studied = RefCell::new(false);
        let result = run_pipeline(
            &config,
            false,
            |_, _| Err(anyhow::anyhow!("embedding backend down")),
            |_, _, _, _| {
                *studied.borrow_mut() = true;
                Ok(empty_report())
            },
        );
        assert!(result.is_err());
        assert!(!*studied.borrow());
    }

    #[test]
    fn missing_markdown_directory_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.paths.markdown_dir = tmp.path().join("absent");
        config.paths.output_dir = tmp.path().join("out");
        let result = run_pipeline(
            &config,
            false,
            |_, _| Ok(PageGroups::new()),
            |_, _, _, _| Ok(empty_report()),
        );
        assert!(result.is_err());
    }
}
