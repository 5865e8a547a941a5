use crate::error::{DocError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest indentation width accepted by [`DocConfig::validate`]
const MAX_INDENT: usize = 16;

/// Largest nesting depth accepted by [`DocConfig::validate`]
pub const MAX_DEPTH_LIMIT: usize = 1024;

/// Nesting depth used when no configuration is given
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration for document encoding and decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocConfig {
    /// How repeated shared objects are marked on write
    pub reference_style: ReferenceStyle,

    /// Spaces per nesting level; `None` renders on a single line
    pub indent: Option<usize>,

    /// Deepest element nesting accepted while decoding
    pub max_depth: usize,

    /// Emit an `<?xml ...?>` prologue
    pub xml_declaration: bool,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            reference_style: ReferenceStyle::Id,
            indent: Some(2),
            max_depth: DEFAULT_MAX_DEPTH,
            xml_declaration: false,
        }
    }
}

impl DocConfig {
    /// Single-line output, useful for fixtures and logs
    pub fn compact() -> Self {
        Self {
            indent: None,
            ..Default::default()
        }
    }

    /// Output shaped like older build records: relative-path references and a prologue
    pub fn legacy_compatible() -> Self {
        Self {
            reference_style: ReferenceStyle::RelativePath,
            xml_declaration: true,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be > 0".to_string());
        }

        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(format!(
                "max_depth ({}) cannot exceed {MAX_DEPTH_LIMIT}",
                self.max_depth
            ));
        }

        if let Some(indent) = self.indent {
            if indent > MAX_INDENT {
                return Err(format!(
                    "indent ({indent}) cannot exceed {MAX_INDENT} spaces"
                ));
            }
        }

        Ok(())
    }

    /// Parse and validate a TOML configuration document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| DocError::invalid_config(e.to_string()))?;
        config.validate().map_err(DocError::invalid_config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|err| match err {
            DocError::InvalidConfig(msg) => {
                DocError::invalid_config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }
}

/// How the writer marks the second and later occurrences of a shared object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceStyle {
    /// `id="N"` on the first occurrence, `reference="N"` afterwards
    #[default]
    Id,

    /// `reference="../../name"`, a path relative to the referencing element
    RelativePath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = DocConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preset_configs_valid() {
        assert!(DocConfig::compact().validate().is_ok());
        assert!(DocConfig::legacy_compatible().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DocConfig::default();

        config.max_depth = 0;
        assert!(config.validate().is_err());

        config.max_depth = MAX_DEPTH_LIMIT + 1;
        assert!(config.validate().is_err());

        config.max_depth = 64;
        config.indent = Some(40);
        assert!(config.validate().is_err());

        config.indent = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let config = DocConfig::from_toml_str(
            r#"
            reference_style = "relative-path"
            indent = 4
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.reference_style, ReferenceStyle::RelativePath);
        assert_eq!(config.indent, Some(4));
        assert_eq!(config.max_depth, 256);
    }

    #[test]
    fn test_config_from_toml_rejects_unknown_and_invalid() {
        assert!(DocConfig::from_toml_str("colour = \"blue\"").is_err());
        assert!(matches!(
            DocConfig::from_toml_str("max_depth = 0"),
            Err(DocError::InvalidConfig(_))
        ));
    }
}
