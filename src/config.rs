//! Configuration for the form core.
//!
//! Layered with the following priority (highest first):
//! 1. CLI flags
//! 2. TOML config file (`--config <path>` or `TASKFORM_CONFIG`)
//! 3. Compiled defaults
//!
//! No path means defaults. An explicit path that cannot be read is an error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::schema::{Messages, Schema, SchemaConfig};
use crate::task::{builtin_templates, TaskTemplate};

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// TOML file structs; every field optional so a file may override any subset.

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    schema: SchemaFileConfig,
    messages: MessagesFileConfig,
    templates: Option<Vec<TaskTemplate>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SchemaFileConfig {
    title_max_len: Option<usize>,
    description_max_len: Option<usize>,
    assignee_nullable: Option<bool>,
    enforce_date_order: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MessagesFileConfig {
    required: Option<String>,
    too_long: Option<String>,
    user_conflict: Option<String>,
    end_condition_required: Option<String>,
    date_order: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub schema: Schema,
    pub templates: Vec<TaskTemplate>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            templates: builtin_templates(),
        }
    }
}

impl Config {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        Self::resolve(file)
    }

    fn resolve(file: ConfigFile) -> Result<Self, ConfigError> {
        let d = SchemaConfig::default();
        let s = file.schema;
        let config = SchemaConfig {
            title_max_len: s.title_max_len.unwrap_or(d.title_max_len),
            description_max_len: s.description_max_len.unwrap_or(d.description_max_len),
            assignee_nullable: s.assignee_nullable.unwrap_or(d.assignee_nullable),
            enforce_date_order: s.enforce_date_order.unwrap_or(d.enforce_date_order),
        };
        if config.title_max_len == 0 {
            return Err(ConfigError::Invalid("title_max_len must be at least 1".into()));
        }

        let d = Messages::default();
        let m = file.messages;
        let messages = Messages {
            required: m.required.unwrap_or(d.required),
            too_long: m.too_long.unwrap_or(d.too_long),
            user_conflict: m.user_conflict.unwrap_or(d.user_conflict),
            end_condition_required: m.end_condition_required.unwrap_or(d.end_condition_required),
            date_order: m.date_order.unwrap_or(d.date_order),
        };

        let templates = file.templates.unwrap_or_else(builtin_templates);
        let mut ids: Vec<u64> = templates.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(ConfigError::Invalid("template ids must be unique".into()));
        }

        Ok(Self {
            schema: Schema::new(config, messages),
            templates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_path_gives_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.templates.len(), 2);
        assert!(!config.schema.config.assignee_nullable);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/taskform.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_partial_overrides() {
        let config = Config::from_toml(
            r#"
            [schema]
            assignee_nullable = true
            title_max_len = 40

            [messages]
            required = "This field is required"

            [[templates]]
            id = 9
            title = "Hotfix"
            "#,
        )
        .unwrap();
        assert!(config.schema.config.assignee_nullable);
        assert_eq!(config.schema.config.title_max_len, 40);
        assert_eq!(config.schema.config.description_max_len, 20);
        assert_eq!(config.schema.messages.required, "This field is required");
        assert_eq!(config.schema.messages.user_conflict, Messages::default().user_conflict);
        assert_eq!(config.templates.len(), 1);
        assert_eq!(config.templates[0].description, "");
    }

    #[test]
    fn test_rejects_bad_files() {
        assert!(matches!(Config::from_toml("[schema]\ntitle_max_len = \"x\""), Err(ConfigError::ParseToml(_))));
        assert!(matches!(Config::from_toml("[schema]\ntitle_max_len = 0"), Err(ConfigError::Invalid(_))));
        assert!(matches!(Config::from_toml("[ui]\ncolour = true"), Err(ConfigError::ParseToml(_))));
        assert!(matches!(
            Config::from_toml("[[templates]]\nid = 1\ntitle = \"a\"\n[[templates]]\nid = 1\ntitle = \"b\""),
            Err(ConfigError::Invalid(_))
        ));
    }
}
