use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime settings of the rule builder, loadable from JSON. Missing keys take defaults.
///
/// ```json
/// { "editor": { "maxDepth": 4 }, "search": { "debounceMs": 250 }, "defaultAuthor": "cds-team" }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderConfig {
    pub editor: EditorConfig,
    pub search: SearchConfig,
    pub default_author: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Deepest group nesting the editor allows, counting the root group as 1.
    pub max_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { max_depth: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_chars: 2,
        }
    }
}

impl BuilderConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.editor.max_depth = max_depth;
        self
    }

    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = Some(author.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = BuilderConfig::from_json(r#"{ "editor": { "maxDepth": 5 } }"#).unwrap();
        assert_eq!(config.editor.max_depth, 5);
        assert_eq!(config.search, SearchConfig::default());
        assert_eq!(config.default_author, None);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(BuilderConfig::from_json("{}").unwrap(), BuilderConfig::default());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = BuilderConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
