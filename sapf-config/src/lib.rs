//! Shared configuration loader for the sapf editor tooling.
//!
//! `defaults/sapf.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer a project `sapf.toml` and
//! user-specific files on top of those defaults via [`Loader`] before
//! deserializing into [`SapfConfig`].
//!
//! Evaluation settings are kept as the strings the user wrote. Turning them into
//! typed values goes through [`EvaluationConfig::resolve_brackets`] and
//! [`EvaluationConfig::resolve_policy`], which fall back to the defaults and hand
//! back a warning instead of failing the whole load.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use sapf_parser::sapf::{BlockPolicy, BracketPair, FormatOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TOML: &str = include_str!("../defaults/sapf.default.toml");

/// Name of the per-project configuration file looked up at the workspace root.
pub const PROJECT_FILE: &str = "sapf.toml";

/// Top-level configuration consumed by sapf applications.
#[derive(Debug, Clone, Deserialize)]
pub struct SapfConfig {
    pub repl: ReplConfig,
    pub evaluation: EvaluationConfig,
    pub formatting: FormattingConfig,
    pub catalog: CatalogConfig,
}

/// How to start the sapf REPL.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplConfig {
    pub binary: String,
    pub args: Vec<String>,
    pub help_command: String,
    pub generate_timeout_secs: u64,
}

impl ReplConfig {
    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    pub brackets: String,
    pub policy: String,
    pub stop_command: String,
}

impl EvaluationConfig {
    /// The configured bracket pair, or `()` plus a warning when the value is unknown.
    pub fn resolve_brackets(&self) -> (BracketPair, Option<String>) {
        let (pair, err) = BracketPair::resolve(&self.brackets);
        (pair, err.map(|err| format!("evaluation.brackets: {err}; using ()")))
    }

    /// The configured block policy, or outermost plus a warning when the value is unknown.
    pub fn resolve_policy(&self) -> (BlockPolicy, Option<String>) {
        let (policy, err) = BlockPolicy::resolve(&self.policy);
        (policy, err.map(|err| format!("evaluation.policy: {err}; using outermost")))
    }

    /// Every warning the evaluation settings produce.
    pub fn warnings(&self) -> Vec<String> {
        [self.resolve_brackets().1, self.resolve_policy().1]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Mirrors the knobs exposed by the indentation formatter.
#[derive(Debug, Clone, Deserialize)]
pub struct FormattingConfig {
    pub indent_size: usize,
    pub comment_prefix: String,
}

impl FormattingConfig {
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            indent_size: self.indent_size,
            comment_prefix: self.comment_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub path: String,
}

impl CatalogConfig {
    /// The catalog file, resolved against `root` when relative. `None` when unset.
    pub fn resolve_path(&self, root: Option<&Path>) -> Option<PathBuf> {
        let trimmed = self.path.trim();
        if trimmed.is_empty() {
            return None;
        }
        let path = PathBuf::from(trimmed);
        match root {
            Some(root) if path.is_relative() => Some(root.join(path)),
            _ => Some(path),
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `sapf.toml` from a workspace root, if there is one.
    pub fn with_project(self, root: impl AsRef<Path>) -> Self {
        self.with_optional_file(root.as_ref().join(PROJECT_FILE))
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<SapfConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<SapfConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sapf_parser::sapf::BracketKind;
    use std::fs;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.repl.binary, "sapf");
        assert!(config.repl.args.is_empty());
        assert_eq!(config.repl.help_command, "helpall");
        assert_eq!(config.repl.generate_timeout(), Duration::from_secs(20));
        assert_eq!(config.evaluation.stop_command, "stop");
        assert_eq!(config.formatting.format_options(), FormatOptions::default());
        assert_eq!(config.catalog.resolve_path(None), None);
        assert!(config.evaluation.warnings().is_empty());
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("evaluation.brackets", "square")
            .expect("override to apply")
            .set_override("evaluation.policy", "innermost")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(
            config.evaluation.resolve_brackets(),
            (BracketKind::Square.pair(), None)
        );
        assert_eq!(
            config.evaluation.resolve_policy(),
            (BlockPolicy::Innermost, None)
        );
    }

    #[test]
    fn unknown_evaluation_values_fall_back_with_warnings() {
        let config = Loader::new()
            .set_override("evaluation.brackets", "angle")
            .expect("override to apply")
            .set_override("evaluation.policy", "sideways")
            .expect("override to apply")
            .build()
            .expect("config to build");

        let (pair, warning) = config.evaluation.resolve_brackets();
        assert_eq!(pair, BracketPair::DEFAULT);
        assert!(warning.expect("bracket warning").contains("angle"));

        let (policy, warning) = config.evaluation.resolve_policy();
        assert_eq!(policy, BlockPolicy::Outermost);
        assert!(warning.expect("policy warning").contains("sideways"));
        assert_eq!(config.evaluation.warnings().len(), 2);
    }

    #[test]
    fn project_file_layers_over_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join(PROJECT_FILE),
            "[formatting]\nindent_size = 2\n\n[catalog]\npath = \"catalog.json\"\n",
        )
        .expect("write project file");

        let config = Loader::new()
            .with_project(dir.path())
            .build()
            .expect("config to build");
        assert_eq!(config.formatting.indent_size, 2);
        assert_eq!(config.formatting.comment_prefix, ";");
        assert_eq!(
            config.catalog.resolve_path(Some(dir.path())),
            Some(dir.path().join("catalog.json"))
        );
    }

    #[test]
    fn missing_project_file_is_fine() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Loader::new()
            .with_project(dir.path())
            .build()
            .expect("config to build");
        assert_eq!(config.repl.binary, "sapf");
    }

    #[test]
    fn required_file_must_exist() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = Loader::new().with_file(dir.path().join("absent.toml")).build();
        assert!(result.is_err());
    }
}
