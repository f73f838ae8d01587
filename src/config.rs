// Configuration management for memportal

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub languages: LanguagesConfig,
    pub indexing: IndexingConfig,
    pub graph: GraphConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for portal databases
    pub base_path: String,
    /// Namespace used when none is given on the command line
    pub default_namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesConfig {
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Depth bound applied to dependency traversals when the command line
    /// gives none; unset means unbounded
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                base_path: ".memportal".to_string(),
                default_namespace: "default".to_string(),
            },
            languages: LanguagesConfig {
                enabled: vec![
                    "python".to_string(),
                    "javascript".to_string(),
                    "rust".to_string(),
                ],
            },
            indexing: IndexingConfig {
                exclude: vec![
                    "target/".to_string(),
                    "node_modules/".to_string(),
                    "*.test.*".to_string(),
                    "**/__tests__/**".to_string(),
                    ".git/".to_string(),
                    ".memportal/".to_string(),
                ],
                include: vec![],
                concurrency: 8,
            },
            graph: GraphConfig { max_depth: None },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from project directory
    /// Looks for .memportal.toml in the project root
    pub fn from_project_dir<P: AsRef<Path>>(project_dir: P) -> Self {
        let config_path = project_dir.as_ref().join(".memportal.toml");

        match Self::from_file(&config_path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", config_path.display());
                config
            }
            Err(e) => {
                tracing::debug!("Could not load config from {}: {}", config_path.display(), e);
                tracing::info!("Using default configuration");
                Self::default()
            }
        }
    }

    /// Base path resolved against the project directory when relative
    pub fn storage_path(&self, project_dir: &Path) -> PathBuf {
        let base = Path::new(&self.storage.base_path);
        if base.is_absolute() {
            base.to_path_buf()
        } else {
            project_dir.join(base)
        }
    }

    /// Check if a file path should be indexed based on include/exclude patterns
    pub fn should_index_file(&self, file_path: &str) -> bool {
        // Check exclude patterns first
        for pattern in &self.indexing.exclude {
            if self.matches_pattern(file_path, pattern) {
                return false;
            }
        }

        // If include patterns are specified, file must match at least one
        if !self.indexing.include.is_empty() {
            for pattern in &self.indexing.include {
                if self.matches_pattern(file_path, pattern) {
                    return true;
                }
            }
            return false; // Include patterns specified but none matched
        }

        // No include patterns, and not excluded, so index it
        true
    }

    /// Simple pattern matching (supports glob-style patterns)
    fn matches_pattern(&self, file_path: &str, pattern: &str) -> bool {
        if pattern.ends_with('/') {
            // Directory pattern
            file_path.starts_with(pattern)
                || file_path.contains(&format!("/{}", pattern.trim_end_matches('/')))
        } else if pattern.starts_with('*') && !pattern.contains("**") {
            // File pattern like *.test.* or *.min.js: the literal pieces
            // between the stars must appear in order, and a pattern that
            // does not end in a star must match at the end of the path
            let parts: Vec<&str> = pattern.split('*').filter(|p| !p.is_empty()).collect();
            let mut rest = file_path;
            for part in &parts {
                match rest.find(part) {
                    Some(idx) => rest = &rest[idx + part.len()..],
                    None => return false,
                }
            }
            pattern.ends_with('*')
                || parts.last().map_or(true, |last| file_path.ends_with(last))
        } else if pattern.contains("**") {
            // Recursive pattern - simplified for **/__tests__/**
            if pattern == "**/__tests__/**" {
                file_path.contains("/__tests__/")
            } else {
                false
            }
        } else {
            // Exact match or prefix
            file_path.contains(pattern)
        }
    }

    /// Get enabled languages, filtered by what's actually supported
    pub fn get_enabled_languages(&self) -> Vec<String> {
        let supported = ["python", "javascript", "rust"];

        self.languages
            .enabled
            .iter()
            .filter(|lang| supported.contains(&lang.as_str()))
            .cloned()
            .collect()
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        // Validate storage settings
        if self.storage.base_path.is_empty() {
            return Err(anyhow::anyhow!("Storage base path cannot be empty"));
        }
        if self.storage.default_namespace.is_empty() {
            return Err(anyhow::anyhow!("Default namespace cannot be empty"));
        }

        // Validate languages
        let supported_languages = ["python", "javascript", "rust"];
        for lang in &self.languages.enabled {
            if !supported_languages.contains(&lang.as_str()) {
                return Err(anyhow::anyhow!("Unsupported language: {}", lang));
            }
        }

        // Validate indexing settings
        if self.indexing.concurrency == 0 {
            return Err(anyhow::anyhow!("Indexing concurrency must be greater than 0"));
        }

        // Validate graph settings
        if self.graph.max_depth == Some(0) {
            return Err(anyhow::anyhow!("Graph max depth must be greater than 0"));
        }

        // Validate logging
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level));
        }
        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!("Invalid log format: {}", self.logging.format));
        }

        Ok(())
    }
}

/// Load configuration for a project
pub fn load_config(project_dir: &str) -> Config {
    Config::from_project_dir(project_dir)
}
