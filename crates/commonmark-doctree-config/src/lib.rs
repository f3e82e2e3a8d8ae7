use commonmark_doctree_engine::{ParserOptions, Pipeline, TransformConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholder the url resolver template substitutes the relative path into.
pub const PATH_PLACEHOLDER: &str = "{path}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("url_resolver template {template:?} has no {{path}} placeholder")]
    InvalidUrlResolver { template: String },

    #[error("{field} contains an empty suffix")]
    InvalidSuffix { field: &'static str },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Project root links are resolved against. Defaults to the document's
    /// directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,
    pub parser: ParserSection,
    pub transform: TransformSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_url_schemes: Option<Vec<String>>,
    pub html_pipeline: bool,
    pub tables: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSection {
    pub enable_auto_toc_tree: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_toc_tree_section: Option<String>,
    pub enable_auto_doc_ref: bool,
    /// Template with a `{path}` placeholder, e.g.
    /// `https://github.com/org/repo/blob/main/{path}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_resolver: Option<String>,
    pub enable_eval_rst: bool,
    pub enable_math: bool,
    pub enable_inline_math: bool,
    pub enable_table_extension: bool,
    pub commonmark_suffixes: Vec<String>,
    pub document_suffixes: Vec<String>,
}

impl Default for TransformSection {
    fn default() -> Self {
        let defaults = TransformConfig::default();
        Self {
            enable_auto_toc_tree: defaults.enable_auto_toc_tree,
            auto_toc_tree_section: defaults.auto_toc_tree_section,
            enable_auto_doc_ref: defaults.enable_auto_doc_ref,
            url_resolver: None,
            enable_eval_rst: defaults.enable_eval_rst,
            enable_math: defaults.enable_math,
            enable_inline_math: defaults.enable_inline_math,
            enable_table_extension: defaults.enable_table_extension,
            commonmark_suffixes: defaults.commonmark_suffixes,
            document_suffixes: defaults.document_suffixes,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the project root
        config.root_dir = config
            .root_dir
            .map(|root| Self::expand_path(&root).unwrap_or(root));

        config.validate()?;
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/commonmark-doctree");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Reject settings that would only fail once documents are processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(template) = &self.transform.url_resolver {
            if !template.contains(PATH_PLACEHOLDER) {
                return Err(ConfigError::InvalidUrlResolver {
                    template: template.clone(),
                });
            }
        }
        if self.transform.commonmark_suffixes.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidSuffix {
                field: "commonmark_suffixes",
            });
        }
        if self.transform.document_suffixes.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidSuffix {
                field: "document_suffixes",
            });
        }
        Ok(())
    }

    pub fn to_parser_options(&self) -> ParserOptions {
        ParserOptions {
            known_url_schemes: self.parser.known_url_schemes.clone(),
            pipeline: if self.parser.html_pipeline {
                Pipeline::Html
            } else {
                Pipeline::Events
            },
            tables: self.parser.tables,
        }
    }

    pub fn to_transform_config(&self) -> Result<TransformConfig, ConfigError> {
        self.validate()?;
        let section = &self.transform;
        let config = TransformConfig {
            enable_auto_toc_tree: section.enable_auto_toc_tree,
            auto_toc_tree_section: section.auto_toc_tree_section.clone(),
            enable_auto_doc_ref: section.enable_auto_doc_ref,
            enable_eval_rst: section.enable_eval_rst,
            enable_math: section.enable_math,
            enable_inline_math: section.enable_inline_math,
            enable_table_extension: section.enable_table_extension,
            commonmark_suffixes: section.commonmark_suffixes.clone(),
            // dotted suffixes are accepted and stored bare
            document_suffixes: section
                .document_suffixes
                .iter()
                .map(|s| s.trim_start_matches('.').to_string())
                .collect(),
            ..TransformConfig::default()
        };

        Ok(match &section.url_resolver {
            Some(template) => {
                let template = template.clone();
                config.with_url_resolver(move |path| template.replace(PATH_PLACEHOLDER, path))
            }
            None => config,
        })
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
