//! Built-in markup tokenizer
//!
//! Markup is scanned with a hand-written cursor rather than logos: template delimiters are
//! configured per call, and raw-text elements switch the scanner into a different mode
//! half-way through the input, neither of which a static lexer expresses well.
//!
//! The scanner produces a flat token sequence:
//!
//!     - `Tpl` for template regions, wherever they appear outside tags
//!     - `HtmlComment`, `HtmlDoctype` (also used for `<?...?>` processing instructions)
//!     - `HtmlTagStart` with a parsed [`TagDetail`], `HtmlTagEnd`
//!     - `HtmlText` for everything else
//!     - `HtmlTagStyle` / `HtmlTagScript` for `<style>` and `<script>` elements. These carry
//!       their start tag, body and end tag in the `start`, `content` and `end` extension
//!       slots. The body is never tokenized here; a script start tag records its lowercased
//!       `type` attribute in its own `type` slot.
//!
//! Inside a start tag, template regions may stand in attribute position (kept as an
//! [`Attr`] with `is_tpl` set) or inside attribute values. Every byte of a start tag is
//! captured by its [`TagDetail`], so `detail.render(None)` reproduces the tag exactly.

mod stringify;

pub use stringify::stringify;

use super::template::{TemplateAdapter, TemplateAdapters, TemplateScanner};
use super::{Grammar, MarkupBackend, StringifyCallbacks, TokenizeOptions};
use crate::error::BackendError;
use crate::location::SourceLocation;
use crate::token::{Attr, ExtKey, ExtValue, TagDetail, Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static STYLE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</style\s*>").unwrap());
static SCRIPT_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</script\s*>").unwrap());

/// The built-in markup tokenizer
#[derive(Debug, Clone, Default)]
pub struct MarkupTokenizer {
    adapters: TemplateAdapters,
}

impl MarkupTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template adapter for `engine`
    pub fn register_template(&mut self, engine: impl Into<String>, adapter: Arc<dyn TemplateAdapter>) {
        self.adapters.register(engine, adapter);
    }
}

impl MarkupBackend for MarkupTokenizer {
    fn tokenize(
        &self,
        source: &str,
        options: &TokenizeOptions<'_>,
    ) -> Result<Vec<Token>, BackendError> {
        Cursor {
            source,
            pos: 0,
            locator: SourceLocation::with_origin(source, options.origin),
            templates: self.adapters.scanner(options.template),
            tokens: Vec::new(),
        }
        .run()
    }

    fn stringify(
        &self,
        tokens: &[Token],
        callbacks: &StringifyCallbacks<'_>,
    ) -> Result<String, BackendError> {
        stringify(tokens, callbacks)
    }
}

struct Cursor<'a> {
    source: &'a str,
    pos: usize,
    locator: SourceLocation,
    templates: TemplateScanner<'a>,
    tokens: Vec<Token>,
}

impl<'a> Cursor<'a> {
    fn run(mut self) -> Result<Vec<Token>, BackendError> {
        while self.pos < self.source.len() {
            let rest = self.rest();
            if self.templates.opens(rest) {
                let end = self.template_end(self.pos)?;
                self.push(TokenKind::Tpl, self.pos, end);
            } else if rest.starts_with("<!--") {
                let end = self.find_after(self.pos + 4, "-->", "unclosed comment")?;
                self.push(TokenKind::HtmlComment, self.pos, end);
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                let end = self.find_after(self.pos + 2, ">", "unclosed declaration")?;
                self.push(TokenKind::HtmlDoctype, self.pos, end);
            } else if starts_end_tag(rest) {
                let token = self.end_tag(self.pos)?;
                self.pos += token.value.len();
                self.tokens.push(token);
            } else if starts_start_tag(rest) {
                self.element()?;
            } else {
                let end = self.text_end(self.pos);
                self.push(TokenKind::HtmlText, self.pos, end);
            }
        }
        Ok(self.tokens)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn error(&self, message: impl Into<String>, at: usize) -> BackendError {
        BackendError::new(Grammar::Markup, message).at(self.locator.byte_to_position(at))
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token::new(kind, &self.source[start..end], self.locator.range(start..end))
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        let token = self.token(kind, start, end);
        self.tokens.push(token);
        self.pos = end;
    }

    fn template_end(&self, at: usize) -> Result<usize, BackendError> {
        self.templates
            .scan(&self.source[at..])
            .map(|len| at + len)
            .ok_or_else(|| self.error("unclosed template region", at))
    }

    /// Offset just past the first `needle` at or after `from`
    fn find_after(&self, from: usize, needle: &str, message: &str) -> Result<usize, BackendError> {
        self.source[from..]
            .find(needle)
            .map(|i| from + i + needle.len())
            .ok_or_else(|| self.error(message, self.pos))
    }

    /// End of a text run: the next template region or markup construct
    fn text_end(&self, from: usize) -> usize {
        let mut at = from;
        loop {
            let rest = &self.source[at..];
            let next = match (rest.find('<'), self.templates.next_open(rest)) {
                (Some(lt), Some(tpl)) => lt.min(tpl),
                (Some(lt), None) => lt,
                (None, Some(tpl)) => tpl,
                (None, None) => return self.source.len(),
            };
            let candidate = &rest[next..];
            if next + at > from
                && (self.templates.opens(candidate)
                    || candidate.starts_with("<!")
                    || candidate.starts_with("<?")
                    || starts_end_tag(candidate)
                    || starts_start_tag(candidate))
            {
                return at + next;
            }
            // A stray `<`; skip it (one byte) and keep looking.
            at += next + 1;
        }
    }

    fn end_tag(&self, start: usize) -> Result<Token, BackendError> {
        let name_end = self.name_end(start + 2);
        let end = self.find_after(name_end, ">", "unclosed end tag")?;
        let name = &self.source[start + 2..name_end];
        let detail = TagDetail {
            name: name.to_string(),
            name_lower: name.to_ascii_lowercase(),
            ..Default::default()
        };
        Ok(self.token(TokenKind::HtmlTagEnd, start, end).with_detail(detail))
    }

    fn name_end(&self, from: usize) -> usize {
        let mut at = from;
        while at < self.source.len() {
            let rest = &self.source[at..];
            if rest.starts_with(|c: char| c.is_whitespace() || c == '>')
                || rest.starts_with("/>")
                || self.templates.opens(rest)
            {
                break;
            }
            at += rest.chars().next().map_or(1, char::len_utf8);
        }
        at
    }

    fn whitespace_end(&self, from: usize) -> usize {
        let rest = &self.source[from..];
        from + (rest.len() - rest.trim_start().len())
    }

    /// A start tag, plus the body and end tag of a raw-text element
    fn element(&mut self) -> Result<(), BackendError> {
        let start = self.pos;
        let (detail, end) = self.start_tag(start)?;
        let mut start_token = self.token(TokenKind::HtmlTagStart, start, end).with_detail(detail);

        let raw = match start_token.detail.as_ref() {
            Some(detail) if !detail.self_closing => match detail.name_lower.as_str() {
                "style" => Some((TokenKind::HtmlTagStyle, &*STYLE_END)),
                "script" => Some((TokenKind::HtmlTagScript, &*SCRIPT_END)),
                _ => None,
            },
            _ => None,
        };

        let Some((kind, closer)) = raw else {
            self.tokens.push(start_token);
            self.pos = end;
            return Ok(());
        };

        let (content_end, end_tag) = match closer.find(&self.source[end..]) {
            Some(m) => (end + m.start(), Some((end + m.start(), end + m.end()))),
            None => (self.source.len(), None),
        };
        let block_end = end_tag.map_or(content_end, |(_, close)| close);

        if kind == TokenKind::HtmlTagScript {
            let declared = start_token
                .detail
                .as_ref()
                .and_then(|detail| detail.attr_value("type"))
                .map(|value| value.trim().to_ascii_lowercase());
            if let Some(declared) = declared {
                start_token.ext.insert(ExtKey::Type, ExtValue::Text(declared));
            }
        }

        let mut block = self.token(kind, start, block_end);
        block.ext.insert(ExtKey::Start, ExtValue::Token(Box::new(start_token)));
        block.ext.insert(
            ExtKey::Content,
            ExtValue::Token(Box::new(self.token(TokenKind::HtmlText, end, content_end))),
        );
        if let Some((open, _)) = end_tag {
            let end_token = self.end_tag(open)?;
            block.ext.insert(ExtKey::End, ExtValue::Token(Box::new(end_token)));
        }

        self.tokens.push(block);
        self.pos = block_end;
        Ok(())
    }

    /// Parse the start tag opening at `start`; returns its detail and end offset
    fn start_tag(&self, start: usize) -> Result<(TagDetail, usize), BackendError> {
        let name_end = self.name_end(start + 1);
        let name = &self.source[start + 1..name_end];
        let mut detail = TagDetail {
            name: name.to_string(),
            name_lower: name.to_ascii_lowercase(),
            ..Default::default()
        };

        let mut at = name_end;
        loop {
            let leading_end = self.whitespace_end(at);
            let leading = &self.source[at..leading_end];
            let rest = &self.source[leading_end..];

            if rest.is_empty() {
                return Err(self.error(format!("unclosed tag <{}>", detail.name), start));
            }
            if rest.starts_with("/>") {
                detail.tail = leading.to_string();
                detail.self_closing = true;
                return Ok((detail, leading_end + 2));
            }
            if rest.starts_with('>') {
                detail.tail = leading.to_string();
                return Ok((detail, leading_end + 1));
            }

            if self.templates.opens(rest) {
                let end = self.template_end(leading_end)?;
                let text = &self.source[leading_end..end];
                detail.attrs.push(Attr {
                    leading: leading.to_string(),
                    name: text.to_string(),
                    name_lower: text.to_string(),
                    is_tpl: true,
                    ..Default::default()
                });
                at = end;
                continue;
            }

            let (attr, end) = self.attribute(leading, leading_end)?;
            detail.attrs.push(attr);
            at = end;
        }
    }

    fn attribute(&self, leading: &str, start: usize) -> Result<(Attr, usize), BackendError> {
        let mut name_end = start;
        while name_end < self.source.len() {
            let rest = &self.source[name_end..];
            if rest.starts_with(|c: char| c.is_whitespace() || c == '=' || c == '>')
                || rest.starts_with("/>")
                || self.templates.opens(rest)
            {
                break;
            }
            name_end += rest.chars().next().map_or(1, char::len_utf8);
        }
        if name_end == start {
            // `=` or a lone `/` where a name should be; keep it as a name of its own
            name_end += self.source[start..].chars().next().map_or(1, char::len_utf8);
        }

        let name = &self.source[start..name_end];
        let mut attr = Attr {
            leading: leading.to_string(),
            name: name.to_string(),
            name_lower: name.to_ascii_lowercase(),
            ..Default::default()
        };

        let before_eq = self.whitespace_end(name_end);
        if !self.source[before_eq..].starts_with('=') || name == "=" {
            return Ok((attr, name_end));
        }
        let value_start = self.whitespace_end(before_eq + 1);
        attr.assign = self.source[name_end..value_start].to_string();

        let rest = &self.source[value_start..];
        let (inner_start, inner_end, end) = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                attr.quote = Some(quote);
                let close = self.quoted_end(value_start + 1, quote)?;
                (value_start + 1, close, close + 1)
            }
            _ => {
                let end = self.unquoted_end(value_start)?;
                (value_start, end, end)
            }
        };

        attr.value = Some(self.source[inner_start..inner_end].to_string());
        attr.value_range = Some(self.locator.range(inner_start..inner_end));
        Ok((attr, end))
    }

    /// Offset of the closing quote; template regions inside the value are skipped whole
    fn quoted_end(&self, from: usize, quote: char) -> Result<usize, BackendError> {
        let mut at = from;
        while at < self.source.len() {
            let rest = &self.source[at..];
            if self.templates.opens(rest) {
                at = self.template_end(at)?;
                continue;
            }
            if rest.starts_with(quote) {
                return Ok(at);
            }
            at += rest.chars().next().map_or(1, char::len_utf8);
        }
        Err(self.error("unclosed attribute value", from - 1))
    }

    fn unquoted_end(&self, from: usize) -> Result<usize, BackendError> {
        let mut at = from;
        while at < self.source.len() {
            let rest = &self.source[at..];
            if self.templates.opens(rest) {
                at = self.template_end(at)?;
                continue;
            }
            if rest.starts_with(|c: char| c.is_whitespace() || c == '>') {
                break;
            }
            at += rest.chars().next().map_or(1, char::len_utf8);
        }
        Ok(at)
    }
}

fn starts_start_tag(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn starts_end_tag(rest: &str) -> bool {
    rest.strip_prefix("</")
        .and_then(|tail| tail.chars().next())
        .is_some_and(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use crate::location::{Origin, Position};
    use rstest::rstest;

    fn tokenize(source: &str) -> Vec<Token> {
        let template = TemplateConfig::default();
        MarkupTokenizer::new()
            .tokenize(source, &TokenizeOptions::new(&template))
            .expect("tokenize")
    }

    fn kinds(tokens: &[Token]) -> Vec<(TokenKind, &str)> {
        tokens.iter().map(|t| (t.kind, t.value.as_str())).collect()
    }

    #[test]
    fn test_flat_document() {
        let tokens = tokenize("<!DOCTYPE html><p class=\"a\">Hi {%$name%} a < b</p><!-- c -->");
        assert_eq!(
            kinds(&tokens),
            vec![
                (TokenKind::HtmlDoctype, "<!DOCTYPE html>"),
                (TokenKind::HtmlTagStart, "<p class=\"a\">"),
                (TokenKind::HtmlText, "Hi "),
                (TokenKind::Tpl, "{%$name%}"),
                (TokenKind::HtmlText, " a < b"),
                (TokenKind::HtmlTagEnd, "</p>"),
                (TokenKind::HtmlComment, "<!-- c -->"),
            ]
        );
    }

    #[test]
    fn test_attributes() {
        let tokens = tokenize("<input TYPE = 'text' disabled value={%$v%} data-x=a/b {%if $c%}checked{%/if%}/>");
        let detail = tokens[0].detail.as_ref().expect("detail");
        assert!(detail.self_closing);
        assert_eq!(detail.name, "input");

        let names: Vec<_> = detail.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["TYPE", "disabled", "value", "data-x", "{%if $c%}", "checked", "{%/if%}"]
        );
        assert_eq!(detail.attr_value("type"), Some("text"));
        assert_eq!(detail.attrs[0].assign, " = ");
        assert_eq!(detail.attrs[0].quote, Some('\''));
        assert_eq!(detail.attr_value("value"), Some("{%$v%}"));
        assert_eq!(detail.attr_value("data-x"), Some("a/b"));
        assert!(detail.attrs[4].is_tpl);
        assert_eq!(detail.attrs[5].leading, "");
    }

    #[rstest]
    #[case("<a>")]
    #[case("<a href=\"x\" >")]
    #[case("<img src='a.png'/>")]
    #[case("<br />")]
    #[case("<div\n  id=main\tclass = \"x {%$y|default:\"z\"%}\"\n>")]
    #[case("<p {%$attrs%} style=\"color:red\">")]
    #[case("<x = / y>")]
    fn test_detail_renders_tag_exactly(#[case] source: &str) {
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 1);
        let detail = tokens[0].detail.as_ref().expect("detail");
        assert_eq!(detail.render(None), source);
    }

    #[test]
    fn test_style_block_parts() {
        let tokens = tokenize("<style media=all>\np{top:0}\n</STYLE >x");
        assert_eq!(tokens.len(), 2);
        let block = &tokens[0];
        assert_eq!(block.kind, TokenKind::HtmlTagStyle);
        assert_eq!(block.value, "<style media=all>\np{top:0}\n</STYLE >");

        let content = block.ext.token(ExtKey::Content).expect("content");
        assert_eq!(content.value, "\np{top:0}\n");
        assert_eq!(content.range.start, Position::new(0, 17));
        assert_eq!(block.ext.token(ExtKey::End).expect("end").value, "</STYLE >");
        assert_eq!(tokens[1].value, "x");
    }

    #[test]
    fn test_script_block_records_type() {
        let tokens = tokenize("<script type=\" Text/Template \"><p>{%$a%}</p></script>");
        let block = &tokens[0];
        assert_eq!(block.kind, TokenKind::HtmlTagScript);
        let start = block.ext.token(ExtKey::Start).expect("start");
        assert_eq!(start.ext.text(ExtKey::Type), Some("text/template"));
        assert_eq!(
            block.ext.token(ExtKey::Content).expect("content").value,
            "<p>{%$a%}</p>"
        );
    }

    #[test]
    fn test_unclosed_script_runs_to_end() {
        let tokens = tokenize("<script>var a = 1;");
        let block = &tokens[0];
        assert_eq!(block.ext.token(ExtKey::Content).expect("content").value, "var a = 1;");
        assert!(!block.ext.contains(ExtKey::End));
        assert!(!block
            .ext
            .token(ExtKey::Start)
            .expect("start")
            .ext
            .contains(ExtKey::Type));
    }

    #[rstest]
    #[case("<p>{%if $a", "unclosed template region", Position::new(0, 3))]
    #[case("a\n<!-- x", "unclosed comment", Position::new(1, 0))]
    #[case("<div class=\"x", "unclosed attribute value", Position::new(0, 11))]
    #[case("<div class=x", "unclosed tag <div>", Position::new(0, 0))]
    fn test_errors(#[case] source: &str, #[case] message: &str, #[case] position: Position) {
        let template = TemplateConfig::default();
        let err = MarkupTokenizer::new()
            .tokenize(source, &TokenizeOptions::new(&template))
            .unwrap_err();
        assert_eq!(err.grammar, Grammar::Markup);
        assert_eq!(err.message, message);
        assert_eq!(err.position, Some(position));
    }

    #[test]
    fn test_origin_is_applied() {
        let template = TemplateConfig::default();
        let options = TokenizeOptions::new(&template).at(Origin::new(40, 3, 8));
        let tokens = MarkupTokenizer::new()
            .tokenize("<b>x</b>\n<i>", &options)
            .expect("tokenize");
        assert_eq!(tokens[0].range.start, Position::new(3, 8));
        assert_eq!(tokens[0].range.span, 40..43);
        let italic = tokens.last().expect("token");
        assert_eq!(italic.range.start, Position::new(4, 0));
        assert_eq!(italic.range.span, 49..52);
    }

    #[test]
    fn test_custom_delimiters() {
        let template = TemplateConfig::new("ejs", "<%", "%>");
        let tokens = MarkupTokenizer::new()
            .tokenize("<p><%= a %></p>", &TokenizeOptions::new(&template))
            .expect("tokenize");
        assert_eq!(tokens[1].kind, TokenKind::Tpl);
        assert_eq!(tokens[1].value, "<%= a %>");
    }
}
