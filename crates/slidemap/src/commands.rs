use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use slidemap_core::{extract_pdf_pages, Hdbscan, PageGroups, PageGrouper};
use slidemap_study::{EmbeddingClient, MindMap};

use crate::config::AppConfig;

pub fn extract(config: &AppConfig, pdf: &Path, out: Option<PathBuf>) -> Result<()> {
    let out_dir = out.unwrap_or_else(|| config.paths.markdown_dir.clone());
    let written = extract_pdf_pages(pdf, &out_dir, &config.grouping.page_name)?;
    println!("wrote {} pages to {}", written.len(), out_dir.display());
    Ok(())
}

/// Runs the grouping core with the configured embedding backend.
pub fn group_pages(config: &AppConfig, dir: &Path) -> Result<PageGroups> {
    let embedder = EmbeddingClient::from_config(&config.embedding)?;
    let grouper = PageGrouper::new(
        config.grouping.clone(),
        embedder,
        Hdbscan::from_config(&config.grouping),
    )?;
    Ok(grouper.run(dir)?)
}

pub fn group(config: &AppConfig, dir: Option<PathBuf>, json: bool) -> Result<()> {
    let dir = dir.unwrap_or_else(|| config.paths.markdown_dir.clone());
    let groups = group_pages(config, &dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        print!("{}", describe_groups(&groups));
    }
    Ok(())
}

pub fn render(json: &Path, out: Option<PathBuf>) -> Result<()> {
    let raw = fs::read_to_string(json)
        .with_context(|| format!("failed to read {}", json.display()))?;
    let map: MindMap = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a nodes/edges document", json.display()))?;
    map.validate()?;
    let out = out.unwrap_or_else(|| json.with_extension("dot"));
    fs::write(&out, map.to_dot()).with_context(|| format!("failed to write {}", out.display()))?;
    info!(nodes = map.nodes.len(), edges = map.edges.len(), "wrote {}", out.display());
    Ok(())
}

fn describe_groups(groups: &PageGroups) -> String {
    let mut out = String::new();
    for (index, pages) in groups.iter() {
        let pages: Vec<String> = pages.iter().map(|page| page.to_string()).collect();
        out.push_str(&format!("group {index}: pages {}\n", pages.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidemap_core::group_contiguous;

    #[test]
    fn groups_are_listed_one_per_line() {
        let groups = group_contiguous(&[0, 0, -1, 1]);
        assert_eq!(
            describe_groups(&groups),
            "group 0: pages 1, 2\ngroup 1: pages 3\ngroup 2: pages 4\n"
        );
    }

    #[test]
    fn group_pages_uses_configured_directory_contents() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("page-01.md"), "alpha").unwrap();
        fs::write(tmp.path().join("page-02.md"), "beta").unwrap();
        let groups = group_pages(&AppConfig::default(), tmp.path()).unwrap();
        assert_eq!(groups.page_count(), 2);
    }

    #[test]
    fn render_writes_dot_next_to_json() {
        let tmp = tempfile::tempdir().unwrap();
        let json = tmp.path().join("nodes_edges.json");
        fs::write(
            &json,
            r#"{"nodes":[{"id":"root","label":"Root"},{"id":"leaf","label":"Leaf"}],
                "edges":[{"from":"root","to":"leaf","label":"has"}]}"#,
        )
        .unwrap();
        render(&json, None).unwrap();
        let dot = fs::read_to_string(tmp.path().join("nodes_edges.dot")).unwrap();
        assert!(dot.contains("\"root\" -> \"leaf\" [label=\"has\"];"));
    }

    #[test]
    fn render_rejects_invalid_map() {
        let tmp = tempfile::tempdir().unwrap();
        let json = tmp.path().join("bad.json");
        fs::write(&json, r#"{"nodes":[{"id":"Root Node","label":"x"}],"edges":[]}"#).unwrap();
        assert!(render(&json, Some(tmp.path().join("bad.dot"))).is_err());
        assert!(!tmp.path().join("bad.dot").exists());
    }
}
