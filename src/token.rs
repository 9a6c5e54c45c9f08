//! Token model shared by the markup and style grammars
//!
//! A [`Token`] is the unit every tokenizer produces. Besides its kind, exact source text and
//! location, a token owns an [`Extensions`] slot: a small map from fixed [`ExtKey`]s to
//! [`ExtValue`] payloads. Raw-text elements use it to expose their start tag, body and end
//! tag, and the embedding engine uses it to hang nested token sequences (style declarations,
//! stylesheet bodies, markup found inside template scripts) under the token that owns the
//! region. Payloads are owned, so the composite result is a strict tree.

use crate::backends::script::ScriptTree;
use crate::location::Range;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Kind tag of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    // Markup
    HtmlTagStart,
    HtmlTagEnd,
    HtmlText,
    HtmlComment,
    HtmlDoctype,
    /// `<style>...</style>` as a single token, parts in `start`/`content`/`end`
    HtmlTagStyle,
    /// `<script>...</script>` as a single token, parts in `start`/`content`/`end`
    HtmlTagScript,

    // Style
    CssSelector,
    CssAtRule,
    CssLeftBrace,
    CssRightBrace,
    CssProperty,
    CssColon,
    CssValue,
    CssSemicolon,
    CssComment,
    CssWhitespace,

    /// Template region (`{% ... %}`), produced by both grammars
    Tpl,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::HtmlTagStart => "html-tag-start",
            TokenKind::HtmlTagEnd => "html-tag-end",
            TokenKind::HtmlText => "html-text",
            TokenKind::HtmlComment => "html-comment",
            TokenKind::HtmlDoctype => "html-doctype",
            TokenKind::HtmlTagStyle => "html-tag-style",
            TokenKind::HtmlTagScript => "html-tag-script",
            TokenKind::CssSelector => "css-selector",
            TokenKind::CssAtRule => "css-at-rule",
            TokenKind::CssLeftBrace => "css-left-brace",
            TokenKind::CssRightBrace => "css-right-brace",
            TokenKind::CssProperty => "css-property",
            TokenKind::CssColon => "css-colon",
            TokenKind::CssValue => "css-value",
            TokenKind::CssSemicolon => "css-semicolon",
            TokenKind::CssComment => "css-comment",
            TokenKind::CssWhitespace => "css-whitespace",
            TokenKind::Tpl => "tpl",
        }
    }

    /// Check if this kind carries no meaning beyond layout
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::CssWhitespace | TokenKind::CssComment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attribute of a start tag, with enough raw text to re-emit it verbatim
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Attr {
    /// Whitespace between the previous item and this attribute
    pub leading: String,
    pub name: String,
    pub name_lower: String,
    /// Raw text between name and value (`=`, ` = `); empty for valueless attributes
    pub assign: String,
    pub quote: Option<char>,
    pub value: Option<String>,
    /// Location of the value text, excluding quotes
    pub value_range: Option<Range>,
    /// The "attribute" is a template region written in attribute position
    pub is_tpl: bool,
}

impl Attr {
    /// Render the attribute, optionally replacing its value text
    pub fn render(&self, out: &mut String, value: Option<&str>) {
        out.push_str(&self.leading);
        out.push_str(&self.name);
        out.push_str(&self.assign);
        if let Some(original) = &self.value {
            let quote = self.quote.map(String::from).unwrap_or_default();
            out.push_str(&quote);
            out.push_str(value.unwrap_or(original));
            out.push_str(&quote);
        }
    }
}

/// Parsed shape of a start tag
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TagDetail {
    pub name: String,
    pub name_lower: String,
    pub attrs: Vec<Attr>,
    /// Whitespace between the last attribute and the closing `>` or `/>`
    pub tail: String,
    pub self_closing: bool,
}

impl TagDetail {
    /// First attribute whose lowercased name matches `name`
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs
            .iter()
            .find(|attr| !attr.is_tpl && attr.name_lower == name)
    }

    /// Value of the first attribute named `name`
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(|attr| attr.value.as_deref())
    }

    /// Render the tag back to text. `style` replaces the value of the `style` attribute
    /// that [`attr`](Self::attr) would find.
    pub fn render(&self, style: Option<&str>) -> String {
        let mut out = String::with_capacity(self.name.len() + 2);
        out.push('<');
        out.push_str(&self.name);
        let mut style = style;
        for attr in &self.attrs {
            if !attr.is_tpl && attr.name_lower == "style" {
                attr.render(&mut out, style.take());
            } else {
                attr.render(&mut out, None);
            }
        }
        out.push_str(&self.tail);
        out.push_str(if self.self_closing { "/>" } else { ">" });
        out
    }
}

/// Fixed keys of the extension slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtKey {
    /// Start tag of a raw-text element
    Start,
    /// Body of a raw-text element
    Content,
    /// End tag of a raw-text element
    End,
    /// Declared `type` of a script start tag
    Type,
    /// Nested tokens parsed from a raw-text body
    Tokens,
    /// Declaration tokens parsed from an inline `style` attribute
    StyleTokens,
    /// Opaque script tree attached to a script body
    Ast,
}

impl ExtKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtKey::Start => "start",
            ExtKey::Content => "content",
            ExtKey::End => "end",
            ExtKey::Type => "type",
            ExtKey::Tokens => "tokens",
            ExtKey::StyleTokens => "styleTokens",
            ExtKey::Ast => "ast",
        }
    }
}

/// Payload stored in an extension slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "grammar", content = "value", rename_all = "kebab-case")]
pub enum ExtValue {
    Token(Box<Token>),
    Markup(Vec<Token>),
    Style(Vec<Token>),
    Script(ScriptTree),
    Text(String),
}

/// Named attachment points of a token
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Extensions(BTreeMap<ExtKey, ExtValue>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Attach a payload, returning whatever was stored under `key` before
    pub fn insert(&mut self, key: ExtKey, value: ExtValue) -> Option<ExtValue> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: ExtKey) -> Option<&ExtValue> {
        self.0.get(&key)
    }

    pub fn contains(&self, key: ExtKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExtKey, &ExtValue)> {
        self.0.iter()
    }

    pub fn token(&self, key: ExtKey) -> Option<&Token> {
        match self.0.get(&key) {
            Some(ExtValue::Token(token)) => Some(token),
            _ => None,
        }
    }

    pub fn token_mut(&mut self, key: ExtKey) -> Option<&mut Token> {
        match self.0.get_mut(&key) {
            Some(ExtValue::Token(token)) => Some(token),
            _ => None,
        }
    }

    pub fn text(&self, key: ExtKey) -> Option<&str> {
        match self.0.get(&key) {
            Some(ExtValue::Text(text)) => Some(text),
            _ => None,
        }
    }
}

/// A token produced by one of the grammars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text of the token
    pub value: String,
    pub range: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<TagDetail>,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, range: Range) -> Self {
        Self {
            kind,
            value: value.into(),
            range,
            detail: None,
            ext: Extensions::new(),
        }
    }

    pub fn with_detail(mut self, detail: TagDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
