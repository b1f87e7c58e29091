use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use slidemap_core::GroupingConfig;
use slidemap_llm::LlmProvider;
use slidemap_study::{EmbeddingConfig, DEFAULT_LANG};

pub const DEFAULT_CONFIG: &str = "slidemap.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub grouping: GroupingConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub markdown_dir: PathBuf,
    /// Rendered slide images; optional, paired with the markdown pages.
    pub image_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            markdown_dir: PathBuf::from("resources/markdowns"),
            image_dir: None,
            output_dir: PathBuf::from("resources"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: Option<String>,
    pub lang: String,
    pub throttle_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            lang: DEFAULT_LANG.to_string(),
            throttle_ms: 0,
        }
    }
}

impl LlmConfig {
    pub fn provider(&self) -> Result<LlmProvider> {
        LlmProvider::from_str(&self.provider)
            .ok_or_else(|| anyhow!(format!("unknown provider {}", self.provider)))
    }

    pub fn model(&self) -> Result<String> {
        match &self.model {
            Some(model) => Ok(model.clone()),
            None => Ok(self.provider()?.default_model().to_string()),
        }
    }
}

impl AppConfig {
    /// Environment overrides for the model settings. API keys never live
    /// in the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(provider) = lookup("SLIDEMAP_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = lookup("SLIDEMAP_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(lang) = lookup("SLIDEMAP_LANG") {
            self.llm.lang = lang;
        }
        if let Some(raw) = lookup("SLIDEMAP_THROTTLE_MS") {
            self.llm.throttle_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid SLIDEMAP_THROTTLE_MS {raw:?}"))?;
        }
        self.llm.provider()?;
        Ok(())
    }
}

/// Reads the configuration file. An explicit path must exist; the default
/// file is optional and its absence means all defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            if default.exists() {
                parse_file(default)?
            } else {
                AppConfig::default()
            }
        }
    };
    config.apply_overrides(|key| env::var(key).ok())?;
    config.grouping.validate()?;
    Ok(config)
}

fn parse_file(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&contents).map_err(|e| anyhow!("invalid config {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn sections_are_optional() {
        let config: AppConfig = toml::from_str(
            r#"
            [paths]
            markdown_dir = "deck/md"
            image_dir = "deck/png"

            [grouping]
            window = 2

            [embedding]
            provider = "openai"
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.markdown_dir, PathBuf::from("deck/md"));
        assert_eq!(config.paths.image_dir, Some(PathBuf::from("deck/png")));
        assert_eq!(config.paths.output_dir, PathBuf::from("resources"));
        assert_eq!(config.grouping.window, 2);
        assert_eq!(config.grouping.min_cluster_size, 2);
        assert_eq!(config.embedding.provider, "openai");
        assert_eq!(config.llm.lang, "de");
    }

    #[test]
    fn environment_overrides_model_settings() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SLIDEMAP_PROVIDER", "local"),
            ("SLIDEMAP_LANG", "en"),
            ("SLIDEMAP_THROTTLE_MS", "250"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.llm.provider().unwrap(), LlmProvider::Local);
        assert_eq!(config.llm.model().unwrap(), "local");
        assert_eq!(config.llm.lang, "en");
        assert_eq!(config.llm.throttle_ms, 250);
    }

    #[test]
    fn bad_overrides_are_rejected() {
        let mut config = AppConfig::default();
        assert!(config
            .apply_overrides(|key| (key == "SLIDEMAP_PROVIDER").then(|| "gemini".to_string()))
            .is_err());
        let mut config = AppConfig::default();
        assert!(config
            .apply_overrides(|key| (key == "SLIDEMAP_THROTTLE_MS").then(|| "soon".to_string()))
            .is_err());
    }

    #[test]
    fn explicit_model_wins_over_provider_default() {
        let llm = LlmConfig {
            model: Some("gpt-4o".to_string()),
            ..LlmConfig::default()
        };
        assert_eq!(llm.model().unwrap(), "gpt-4o");
        assert_eq!(LlmConfig::default().model().unwrap(), "gpt-4.1-mini");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&tmp.path().join("absent.toml"))).is_err());
    }
}
