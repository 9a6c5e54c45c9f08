//! Nested-region locator and embedding engine
//!
//! A markup token sequence can hold three kinds of foreign content:
//!
//!     - inline style: the `style` attribute of a start tag
//!     - style block: the body of a `<style>` element
//!     - template script: the body of a `<script>` element whose declared type is one of
//!       the configured template dialects
//!
//! [`locate`] finds them without touching the tokens. [`embed`] then parses each region
//! through [`dispatch`] at the region's absolute origin and attaches the result to the
//! token that owns it:
//!
//!     - inline style: `styleTokens` on the start tag, as [`ExtValue::Style`]
//!     - style block: `tokens` on the block's content token, as [`ExtValue::Style`]
//!     - template script: `tokens` on the block's content token, as [`ExtValue::Markup`]
//!
//! Script bodies of any other type stay raw text.
//!
//! Inline style values are not complete style documents, so they are parsed wrapped as
//! `*{<value>}` and the wrapper's tokens are trimmed off again. The built-in style
//! tokenizer produces `CssSelector("*")`, `CssLeftBrace`, the declaration tokens and a
//! final `CssRightBrace` for that input; everything between the first left brace and the
//! last right brace is kept. When a backend produces another shape, the first two and the
//! last token are dropped by position instead.

use crate::backends::{Grammar, GrammarRegistry};
use crate::config::Config;
use crate::dispatch::dispatch;
use crate::error::BackendError;
use crate::location::Origin;
use crate::token::{ExtKey, ExtValue, Token, TokenKind};
use std::fmt;
use tracing::trace;

/// What kind of foreign content a region holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    InlineStyle,
    StyleBlock,
    TemplateScript,
}

impl RegionKind {
    pub fn grammar(&self) -> Grammar {
        match self {
            RegionKind::InlineStyle | RegionKind::StyleBlock => Grammar::Style,
            RegionKind::TemplateScript => Grammar::Markup,
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegionKind::InlineStyle => "inline-style",
            RegionKind::StyleBlock => "style-block",
            RegionKind::TemplateScript => "template-script",
        })
    }
}

/// A span of foreign content inside a markup token sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Index of the owning top-level token
    pub index: usize,
    pub kind: RegionKind,
    pub text: String,
    /// Absolute coordinate of the first byte of `text`
    pub origin: Origin,
    /// Declared type of a template script
    pub dialect: Option<String>,
}

/// Find the embedded regions of `tokens`, in document order
pub fn locate(tokens: &[Token], config: &Config) -> Vec<Region> {
    let mut regions = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::HtmlTagStart => {
                regions.extend(inline_style(index, token));
            }
            TokenKind::HtmlTagStyle => {
                regions.extend(token.ext.token(ExtKey::Start).and_then(|start| inline_style(index, start)));
                if let Some(content) = token.ext.token(ExtKey::Content) {
                    regions.push(Region {
                        index,
                        kind: RegionKind::StyleBlock,
                        text: content.value.clone(),
                        origin: Origin::at(&content.range),
                        dialect: None,
                    });
                }
            }
            TokenKind::HtmlTagScript => {
                let start = token.ext.token(ExtKey::Start);
                regions.extend(start.and_then(|start| inline_style(index, start)));

                let dialect = start.and_then(|start| start.ext.text(ExtKey::Type));
                let content = token.ext.token(ExtKey::Content);
                if let (Some(dialect), Some(content)) = (dialect, content) {
                    if config.is_template_dialect(dialect) {
                        regions.push(Region {
                            index,
                            kind: RegionKind::TemplateScript,
                            text: content.value.clone(),
                            origin: Origin::at(&content.range),
                            dialect: Some(dialect.to_string()),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    regions
}

fn inline_style(index: usize, start: &Token) -> Option<Region> {
    let attr = start.detail.as_ref()?.attr("style")?;
    let value = attr.value.as_deref().filter(|value| !value.is_empty())?;
    Some(Region {
        index,
        kind: RegionKind::InlineStyle,
        text: value.to_string(),
        origin: attr.value_range.as_ref().map(Origin::at).unwrap_or_default(),
        dialect: None,
    })
}

/// Parse and attach every embedded region of `tokens`
pub fn embed(
    tokens: &mut [Token],
    config: &Config,
    registry: &GrammarRegistry,
) -> Result<(), BackendError> {
    for region in locate(tokens, config) {
        trace!(
            kind = %region.kind,
            line = region.origin.line,
            column = region.origin.column,
            dialect = region.dialect.as_deref(),
            "embedding region"
        );
        let Some(owner) = tokens.get_mut(region.index) else {
            continue;
        };

        match region.kind {
            RegionKind::InlineStyle => {
                let Some(declarations) = inline_declarations(&region, config, registry)? else {
                    trace!(value = %region.text, "inline style left as text");
                    continue;
                };
                let start = if owner.is(TokenKind::HtmlTagStart) {
                    Some(owner)
                } else {
                    owner.ext.token_mut(ExtKey::Start)
                };
                if let Some(start) = start {
                    start.ext.insert(ExtKey::StyleTokens, ExtValue::Style(declarations));
                }
            }
            RegionKind::StyleBlock => {
                let parsed = dispatch(&region.text, region.kind.grammar(), config, region.origin, registry)?;
                if let Some(content) = owner.ext.token_mut(ExtKey::Content) {
                    content.ext.insert(ExtKey::Tokens, ExtValue::Style(parsed.into_tokens()));
                }
            }
            RegionKind::TemplateScript => {
                let Some(nested) = config.nested_for_script() else {
                    continue;
                };
                let parsed = dispatch(&region.text, region.kind.grammar(), &nested, region.origin, registry)?;
                if let Some(content) = owner.ext.token_mut(ExtKey::Content) {
                    content.ext.insert(ExtKey::Tokens, ExtValue::Markup(parsed.into_tokens()));
                }
            }
        }
    }
    Ok(())
}

/// Parse an inline style value through the `*{..}` wrapper.
///
/// Returns `None` when the wrapper cannot be told apart from the value: the wrapper would
/// join the value's first bytes into the template left delimiter, or the kept tokens do
/// not print back to the value.
fn inline_declarations(
    region: &Region,
    config: &Config,
    registry: &GrammarRegistry,
) -> Result<Option<Vec<Token>>, BackendError> {
    let wrapped = format!("*{{{}}}", region.text);
    if crosses_wrapper(&wrapped, &config.template.ld) {
        return Ok(None);
    }

    let parsed = dispatch(&wrapped, Grammar::Style, config, region.origin.back(2), registry)?;
    let declarations = trim_wrapper(parsed.into_tokens());
    if registry.style().stringify(&declarations)? != region.text {
        return Ok(None);
    }
    Ok(Some(declarations))
}

/// True if an occurrence of `ld` in `wrapped` straddles the end of the `*{` prefix
fn crosses_wrapper(wrapped: &str, ld: &str) -> bool {
    !ld.is_empty()
        && wrapped
            .match_indices(ld)
            .take_while(|(at, _)| *at < 2)
            .any(|(at, _)| at + ld.len() > 2)
}

/// Drop the tokens of the synthetic `*{` `}` wrapper
pub fn trim_wrapper(tokens: Vec<Token>) -> Vec<Token> {
    let open = tokens.iter().position(|t| t.is(TokenKind::CssLeftBrace));
    let close = tokens.iter().rposition(|t| t.is(TokenKind::CssRightBrace));

    let (from, to) = match (open, close) {
        (Some(open), Some(close))
            if open < close
                && tokens[..open].iter().all(|t| {
                    t.kind.is_trivia() || (t.is(TokenKind::CssSelector) && t.value == "*")
                }) =>
        {
            (open + 1, close)
        }
        _ if tokens.len() >= 3 => (2, tokens.len() - 1),
        _ => return Vec::new(),
    };
    tokens.into_iter().take(to).skip(from).collect()
}
