//! Content dispatcher
//!
//! [`dispatch`] is the single entry point through which text becomes a tree, both at the
//! top level and for every embedded region. Markup results go through [`embed`] before
//! they are returned, and `embed` comes back here for each region it finds, so the two
//! recurse into each other until no embedded region is left.
//!
//! [`embed`]: crate::embed::embed

use crate::backends::script::ScriptTree;
use crate::backends::{Grammar, GrammarRegistry, TokenizeOptions};
use crate::config::Config;
use crate::embed;
use crate::error::BackendError;
use crate::location::Origin;
use crate::token::Token;
use serde::Serialize;
use tracing::debug;

/// Result of parsing one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "grammar", content = "tree", rename_all = "lowercase")]
pub enum Ast {
    /// Markup tokens, with embedded regions attached to their owning tokens
    Markup(Vec<Token>),
    Style(Vec<Token>),
    /// Opaque script tree
    Script(ScriptTree),
}

impl Ast {
    pub fn grammar(&self) -> Grammar {
        match self {
            Ast::Markup(_) => Grammar::Markup,
            Ast::Style(_) => Grammar::Style,
            Ast::Script(_) => Grammar::Script,
        }
    }

    /// Top-level tokens; `None` for script trees
    pub fn tokens(&self) -> Option<&[Token]> {
        match self {
            Ast::Markup(tokens) | Ast::Style(tokens) => Some(tokens),
            Ast::Script(_) => None,
        }
    }

    pub fn script(&self) -> Option<&ScriptTree> {
        match self {
            Ast::Script(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn into_tokens(self) -> Vec<Token> {
        match self {
            Ast::Markup(tokens) | Ast::Style(tokens) => tokens,
            Ast::Script(_) => Vec::new(),
        }
    }
}

/// Parse `content` as `grammar`, with its first byte sitting at `origin` in the document
pub fn dispatch(
    content: &str,
    grammar: Grammar,
    config: &Config,
    origin: Origin,
    registry: &GrammarRegistry,
) -> Result<Ast, BackendError> {
    debug!(%grammar, len = content.len(), ?origin, "dispatch");
    let options = TokenizeOptions::new(&config.template).at(origin);

    match grammar {
        Grammar::Script => Ok(Ast::Script(registry.script().parse(content)?)),
        Grammar::Style => Ok(Ast::Style(registry.style().tokenize(content, &options)?)),
        Grammar::Markup => {
            let mut tokens = registry.markup().tokenize(content, &options)?;
            embed::embed(&mut tokens, config, registry)?;
            Ok(Ast::Markup(tokens))
        }
    }
}
