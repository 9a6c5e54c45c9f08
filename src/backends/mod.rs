//! Grammar backends
//!
//! The composition logic never looks inside a grammar. It reaches each one through the
//! capability traits below, and the [`GrammarRegistry`] holds exactly one backend per
//! [`Grammar`] tag:
//!
//! | grammar  | parse direction           | stringify direction                     |
//! |----------|---------------------------|-----------------------------------------|
//! | markup   | `tokenize -> Vec<Token>`  | `stringify(tokens, callbacks)`          |
//! | style    | `tokenize -> Vec<Token>`  | `stringify(tokens)`                     |
//! | script   | `parse -> ScriptTree`     | `generate(tree)`                        |
//!
//! Markup stringification needs [`StringifyCallbacks`] because a markup document can carry
//! style and script payloads it has no business regenerating itself.
//!
//! The built-in backends live in the submodules and are what [`GrammarRegistry::default`]
//! installs. Any of them can be swapped out with the `with_*` builders.

pub mod markup;
pub mod script;
pub mod style;
pub mod template;

use crate::config::TemplateConfig;
use crate::error::BackendError;
use crate::location::Origin;
use crate::token::Token;
use once_cell::sync::Lazy;
use script::ScriptTree;
use serde::Serialize;
use std::fmt;

/// The three supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    Markup,
    Style,
    Script,
}

impl Grammar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grammar::Markup => "markup",
            Grammar::Style => "style",
            Grammar::Script => "script",
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call options handed to a tokenizer
#[derive(Debug, Clone, Copy)]
pub struct TokenizeOptions<'a> {
    pub template: &'a TemplateConfig,
    /// Absolute coordinate of the first byte of the source
    pub origin: Origin,
}

impl<'a> TokenizeOptions<'a> {
    pub fn new(template: &'a TemplateConfig) -> Self {
        Self {
            template,
            origin: Origin::default(),
        }
    }

    pub fn at(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }
}

type ScriptCallback<'a> = dyn Fn(&ScriptTree) -> Result<String, BackendError> + 'a;
type StyleCallback<'a> = dyn Fn(&[Token]) -> Result<String, BackendError> + 'a;

/// Regenerators the markup stringifier calls for embedded regions
pub struct StringifyCallbacks<'a> {
    pub script: &'a ScriptCallback<'a>,
    pub style: &'a StyleCallback<'a>,
}

pub trait MarkupBackend: Send + Sync {
    fn tokenize(
        &self,
        source: &str,
        options: &TokenizeOptions<'_>,
    ) -> Result<Vec<Token>, BackendError>;

    fn stringify(
        &self,
        tokens: &[Token],
        callbacks: &StringifyCallbacks<'_>,
    ) -> Result<String, BackendError>;
}

pub trait StyleBackend: Send + Sync {
    fn tokenize(
        &self,
        source: &str,
        options: &TokenizeOptions<'_>,
    ) -> Result<Vec<Token>, BackendError>;

    fn stringify(&self, tokens: &[Token]) -> Result<String, BackendError>;
}

pub trait ScriptBackend: Send + Sync {
    fn parse(&self, source: &str) -> Result<ScriptTree, BackendError>;

    fn generate(&self, tree: &ScriptTree) -> Result<String, BackendError>;
}

/// One backend per grammar
pub struct GrammarRegistry {
    markup: Box<dyn MarkupBackend>,
    style: Box<dyn StyleBackend>,
    script: Box<dyn ScriptBackend>,
}

impl GrammarRegistry {
    pub fn with_markup<B: MarkupBackend + 'static>(mut self, backend: B) -> Self {
        self.markup = Box::new(backend);
        self
    }

    pub fn with_style<B: StyleBackend + 'static>(mut self, backend: B) -> Self {
        self.style = Box::new(backend);
        self
    }

    pub fn with_script<B: ScriptBackend + 'static>(mut self, backend: B) -> Self {
        self.script = Box::new(backend);
        self
    }

    pub fn markup(&self) -> &dyn MarkupBackend {
        self.markup.as_ref()
    }

    pub fn style(&self) -> &dyn StyleBackend {
        self.style.as_ref()
    }

    pub fn script(&self) -> &dyn ScriptBackend {
        self.script.as_ref()
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self {
            markup: Box::new(markup::MarkupTokenizer::new()),
            style: Box::new(style::StyleTokenizer::new()),
            script: Box::new(script::ScriptParser),
        }
    }
}

/// Registry with the built-in backends
pub static BUILTIN: Lazy<GrammarRegistry> = Lazy::new(GrammarRegistry::default);
