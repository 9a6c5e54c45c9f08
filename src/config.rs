//! Per-invocation configuration
//!
//! A [`Config`] carries the template settings of the document being parsed and, optionally,
//! the set of script dialects whose bodies are markup templates in their own right
//! ([`JsTemplateConfig`]). Those bodies are parsed with the dialect's own template
//! settings, see [`Config::nested_for_script`].
//!
//! `defaults/weft.default.toml` is embedded into the crate. Applications layer their own
//! files on top of it via [`Loader`] before deserializing into [`Config`].

use crate::backends::template::TemplateAdapter;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_TOML: &str = include_str!("../defaults/weft.default.toml");

/// Template engine settings handed to the markup and style tokenizers
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_ld")]
    pub ld: String,
    #[serde(default = "default_rd")]
    pub rd: String,
    /// Custom region scanner registered under `engine` for this call
    #[serde(skip)]
    pub adapter: Option<Arc<dyn TemplateAdapter>>,
}

fn default_engine() -> String {
    "smarty".to_string()
}

fn default_ld() -> String {
    "{%".to_string()
}

fn default_rd() -> String {
    "%}".to_string()
}

impl TemplateConfig {
    pub fn new(engine: impl Into<String>, ld: impl Into<String>, rd: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            ld: ld.into(),
            rd: rd.into(),
            adapter: None,
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn TemplateAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self::new(default_engine(), default_ld(), default_rd())
    }
}

/// Script dialects that embed markup templates
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsTemplateConfig {
    #[serde(rename = "type", alias = "types", default)]
    pub types: BTreeSet<String>,
    #[serde(flatten)]
    pub template: TemplateConfig,
}

impl JsTemplateConfig {
    pub fn new<I, S>(types: I, template: TemplateConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            template,
        }
    }
}

/// Top-level configuration of one parse or stringify call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(rename = "tpl", default)]
    pub template: TemplateConfig,
    #[serde(alias = "jsTpl", default)]
    pub js_tpl: Option<JsTemplateConfig>,
}

impl Config {
    pub fn new(template: TemplateConfig) -> Self {
        Self {
            template,
            js_tpl: None,
        }
    }

    pub fn with_js_tpl(mut self, js_tpl: JsTemplateConfig) -> Self {
        self.js_tpl = Some(js_tpl);
        self
    }

    /// Check if script blocks declared with `dialect` hold markup templates
    pub fn is_template_dialect(&self, dialect: &str) -> bool {
        self.js_tpl
            .as_ref()
            .is_some_and(|js| js.types.contains(dialect))
    }

    /// Configuration for markup found inside a template script block.
    ///
    /// The template settings come from `js_tpl`; `js_tpl` itself is carried over so that
    /// template scripts nested further down are recognized as well.
    pub fn nested_for_script(&self) -> Option<Config> {
        self.js_tpl.as_ref().map(|js| Config {
            template: js.template.clone(),
            js_tpl: Some(js.clone()),
        })
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
        let builder = config::Config::builder()
            .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
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

    /// Layer `path` if it exists. The CLI uses this for `weft.toml` in the working directory.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Override one dotted key, such as `tpl.ld`, above every file layer.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<Config, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::template::NestedAdapter;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.template.engine, "smarty");
        assert_eq!(config.template.ld, "{%");
        assert_eq!(config.template.rd, "%}");
        assert!(config.is_template_dialect("text/template"));
        assert!(!config.is_template_dialect("text/javascript"));
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("tpl.ld", "<%")
            .expect("override to apply")
            .set_override("tpl.rd", "%>")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.template.ld, "<%");
        assert_eq!(config.template.rd, "%>");
        assert_eq!(config.template.engine, "smarty");
    }

    #[test]
    fn layers_user_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weft.toml");
        std::fs::write(
            &path,
            "[js_tpl]\ntype = [\"text/html\"]\nld = \"<%\"\nrd = \"%>\"\n",
        )
        .expect("write config");

        let config = Loader::new().with_file(&path).build().expect("config to build");
        assert!(config.is_template_dialect("text/html"));
        let js = config.js_tpl.as_ref().expect("js_tpl");
        assert_eq!(js.template.ld, "<%");
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/definitely/not/here/weft.toml")
            .build()
            .expect("config to build");
        assert_eq!(config.template.engine, "smarty");
    }

    #[test]
    fn nested_config_switches_template_and_keeps_dialects() {
        let config = Config::new(TemplateConfig::new("smarty", "{%", "%}")).with_js_tpl(
            JsTemplateConfig::new(["text/template"], TemplateConfig::new("ejs", "<%", "%>")),
        );

        let nested = config.nested_for_script().expect("js_tpl configured");
        assert_eq!(nested.template.engine, "ejs");
        assert_eq!(nested.template.ld, "<%");
        assert!(nested.is_template_dialect("text/template"));

        assert!(Config::default().nested_for_script().is_none());
    }

    #[test]
    fn adapter_is_carried_by_clone() {
        let template = TemplateConfig::default().with_adapter(Arc::new(NestedAdapter));
        let config = Config::new(template).clone();
        assert!(config.template.adapter.is_some());
    }
}
