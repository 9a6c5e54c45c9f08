//! Markup token sequences back to text
//!
//! Tokens are emitted from their raw `value` unless an embedded payload is attached:
//!
//!     - a start tag with `styleTokens` is re-rendered from its [`TagDetail`], with the
//!       style attribute value regenerated by the style callback
//!     - a style or script block is emitted part by part (start tag, body, end tag); a body
//!       carrying `tokens` or `ast` is regenerated through the matching callback or, for
//!       nested markup, by recursion
//!
//! [`TagDetail`]: crate::token::TagDetail

use crate::backends::StringifyCallbacks;
use crate::error::BackendError;
use crate::token::{ExtKey, ExtValue, Token, TokenKind};

/// Concatenate the text of `tokens`, regenerating embedded regions
pub fn stringify(
    tokens: &[Token],
    callbacks: &StringifyCallbacks<'_>,
) -> Result<String, BackendError> {
    let mut out = String::new();
    for token in tokens {
        render(token, callbacks, &mut out)?;
    }
    Ok(out)
}

fn render(
    token: &Token,
    callbacks: &StringifyCallbacks<'_>,
    out: &mut String,
) -> Result<(), BackendError> {
    match token.kind {
        TokenKind::HtmlTagStart => render_start(token, callbacks, out),
        TokenKind::HtmlTagStyle | TokenKind::HtmlTagScript => {
            let start = token.ext.token(ExtKey::Start);
            let content = token.ext.token(ExtKey::Content);
            if start.is_none() && content.is_none() {
                out.push_str(&token.value);
                return Ok(());
            }
            if let Some(start) = start {
                render_start(start, callbacks, out)?;
            }
            if let Some(content) = content {
                render_content(content, callbacks, out)?;
            }
            if let Some(end) = token.ext.token(ExtKey::End) {
                out.push_str(&end.value);
            }
            Ok(())
        }
        _ => {
            out.push_str(&token.value);
            Ok(())
        }
    }
}

fn render_start(
    token: &Token,
    callbacks: &StringifyCallbacks<'_>,
    out: &mut String,
) -> Result<(), BackendError> {
    match (&token.detail, token.ext.get(ExtKey::StyleTokens)) {
        (Some(detail), Some(ExtValue::Style(tokens))) => {
            let style = (callbacks.style)(tokens)?;
            out.push_str(&detail.render(Some(&style)));
        }
        _ => out.push_str(&token.value),
    }
    Ok(())
}

fn render_content(
    content: &Token,
    callbacks: &StringifyCallbacks<'_>,
    out: &mut String,
) -> Result<(), BackendError> {
    match (content.ext.get(ExtKey::Tokens), content.ext.get(ExtKey::Ast)) {
        (Some(ExtValue::Style(tokens)), _) => out.push_str(&(callbacks.style)(tokens)?),
        (Some(ExtValue::Markup(tokens)), _) => out.push_str(&stringify(tokens, callbacks)?),
        (_, Some(ExtValue::Script(tree))) => out.push_str(&(callbacks.script)(tree)?),
        _ => out.push_str(&content.value),
    }
    Ok(())
}
