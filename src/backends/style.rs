//! Built-in style tokenizer
//!
//! Tokenization runs in two steps:
//!
//!     1. Raw lexing. Template regions are cut out first (their extent is decided by the
//!        template scanner, not by a static regex), and the text between them goes through
//!        a logos lexer that only knows about whitespace, comments, strings, braces, colons,
//!        semicolons and "everything else".
//!
//!     2. Classification. A small state machine walks the raw lexemes and decides what each
//!        run means depending on where it sits: a selector or at-rule prelude, a property,
//!        or a value. Runs such as `1px solid red` or `div > p` become one token, with
//!        interior whitespace and comments absorbed. Whitespace and comments between
//!        tokens are kept as tokens of their own.
//!
//! Every byte of the input ends up in exactly one token, so [`stringify`] is plain
//! concatenation and round-trips byte for byte.

use super::template::{TemplateAdapter, TemplateAdapters, TemplateScanner};
use super::{Grammar, StyleBackend, TokenizeOptions};
use crate::error::BackendError;
use crate::location::SourceLocation;
use crate::token::{Token, TokenKind};
use logos::Logos;
use std::ops::Range;
use std::sync::Arc;

/// Raw lexemes of the style grammar
///
/// Comments and strings are not matched by logos: the lexer only sees their first
/// character and [`lex_plain`] measures the rest by hand, so an unterminated string can
/// fall back to plain text without any backtracking.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[regex(r#"["']"#)]
    Quote,

    #[token("/")]
    Slash,

    #[regex(r#"[^ \t\r\n\f{}:;"'/]+"#)]
    Word,

    // Measured by hand, never produced by logos
    Comment,
    Str,
    Tpl,
}

/// At-rules whose blocks hold rules rather than declarations
const NESTING_AT_RULES: &[&str] = &[
    "@media",
    "@supports",
    "@document",
    "@layer",
    "@container",
    "@scope",
    "@starting-style",
];

/// The built-in style tokenizer
#[derive(Debug, Clone, Default)]
pub struct StyleTokenizer {
    adapters: TemplateAdapters,
}

impl StyleTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template adapter for `engine`
    pub fn register_template(&mut self, engine: impl Into<String>, adapter: Arc<dyn TemplateAdapter>) {
        self.adapters.register(engine, adapter);
    }
}

impl StyleBackend for StyleTokenizer {
    fn tokenize(
        &self,
        source: &str,
        options: &TokenizeOptions<'_>,
    ) -> Result<Vec<Token>, BackendError> {
        let locator = SourceLocation::with_origin(source, options.origin);
        let scanner = self.adapters.scanner(options.template);
        let raws = lex(source, &scanner, &locator)?;
        let tokens = Classifier::new(source, &raws)
            .run()
            .into_iter()
            .map(|(kind, span)| Token::new(kind, &source[span.clone()], locator.range(span)))
            .collect();
        Ok(tokens)
    }

    fn stringify(&self, tokens: &[Token]) -> Result<String, BackendError> {
        Ok(stringify(tokens))
    }
}

/// Concatenate the text of style tokens
pub fn stringify(tokens: &[Token]) -> String {
    tokens.iter().map(|token| token.value.as_str()).collect()
}

fn lex(
    source: &str,
    scanner: &TemplateScanner<'_>,
    locator: &SourceLocation,
) -> Result<Vec<(Lexeme, Range<usize>)>, BackendError> {
    let mut raws = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        if scanner.opens(rest) {
            let len = scanner.scan(rest).ok_or_else(|| {
                BackendError::new(Grammar::Style, "unclosed template region")
                    .at(locator.byte_to_position(pos))
            })?;
            raws.push((Lexeme::Tpl, pos..pos + len));
            pos += len;
            continue;
        }

        let end = scanner.next_open(rest).map_or(source.len(), |i| pos + i);
        lex_plain(&source[pos..end], pos, locator, &mut raws)?;
        pos = end;
    }

    Ok(raws)
}

fn lex_plain(
    text: &str,
    offset: usize,
    locator: &SourceLocation,
    raws: &mut Vec<(Lexeme, Range<usize>)>,
) -> Result<(), BackendError> {
    let mut lexer = Lexeme::lexer(text);

    while let Some(result) = lexer.next() {
        let start = offset + lexer.span().start;
        let lexeme = match result {
            Ok(Lexeme::Slash) => match lexer.remainder().strip_prefix('*') {
                Some(body) => {
                    let close = body.find("*/").ok_or_else(|| {
                        BackendError::new(Grammar::Style, "unclosed comment")
                            .at(locator.byte_to_position(start))
                    })?;
                    lexer.bump(1 + close + 2);
                    Lexeme::Comment
                }
                None => Lexeme::Word,
            },
            Ok(Lexeme::Quote) => {
                let quote = lexer.slice().as_bytes()[0];
                match string_len(lexer.remainder().as_bytes(), quote) {
                    Some(len) => {
                        lexer.bump(len);
                        Lexeme::Str
                    }
                    None => Lexeme::Word,
                }
            }
            Ok(lexeme) => lexeme,
            Err(()) => {
                return Err(BackendError::new(
                    Grammar::Style,
                    format!("unexpected input {:?}", lexer.slice()),
                )
                .at(locator.byte_to_position(start)));
            }
        };
        raws.push((lexeme, start..offset + lexer.span().end));
    }

    Ok(())
}

/// Bytes up to and including the closing quote, if the string closes on this line
fn string_len(bytes: &[u8], quote: u8) -> Option<usize> {
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'\n' => return None,
            b if b == quote => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Collecting a selector or at-rule prelude
    Prelude,
    Property,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Rules,
    Declarations,
}

struct Classifier<'a> {
    source: &'a str,
    raws: &'a [(Lexeme, Range<usize>)],
    state: State,
    blocks: Vec<Block>,
    /// Span of the run being collected
    pending: Option<Range<usize>>,
    /// Trivia seen since the last significant lexeme
    trivia: Vec<(TokenKind, Range<usize>)>,
    out: Vec<(TokenKind, Range<usize>)>,
}

impl<'a> Classifier<'a> {
    fn new(source: &'a str, raws: &'a [(Lexeme, Range<usize>)]) -> Self {
        Self {
            source,
            raws,
            state: State::Prelude,
            blocks: Vec::new(),
            pending: None,
            trivia: Vec::new(),
            out: Vec::with_capacity(raws.len()),
        }
    }

    fn run(mut self) -> Vec<(TokenKind, Range<usize>)> {
        for (index, (lexeme, span)) in self.raws.iter().enumerate() {
            let span = span.clone();
            match lexeme {
                Lexeme::Whitespace => self.trivia.push((TokenKind::CssWhitespace, span)),
                Lexeme::Comment => self.trivia.push((TokenKind::CssComment, span)),
                Lexeme::Tpl => {
                    self.flush();
                    self.out.push((TokenKind::Tpl, span));
                }
                Lexeme::Colon if self.state == State::Property => {
                    self.flush();
                    self.out.push((TokenKind::CssColon, span));
                    self.state = State::Value;
                }
                Lexeme::Semicolon => {
                    self.flush();
                    self.out.push((TokenKind::CssSemicolon, span));
                    if self.state == State::Value {
                        self.state = State::Property;
                    }
                }
                Lexeme::LeftBrace => self.open_block(span),
                Lexeme::RightBrace => self.close_block(span),
                Lexeme::Colon | Lexeme::Str | Lexeme::Word | Lexeme::Quote | Lexeme::Slash => {
                    self.extend(index, span)
                }
            }
        }
        self.flush();
        self.out
    }

    fn extend(&mut self, index: usize, span: Range<usize>) {
        match &mut self.pending {
            Some(pending) => {
                pending.end = span.end;
                self.trivia.clear();
            }
            None => {
                self.flush_trivia();
                if self.state == State::Property && self.starts_nested_rule(index) {
                    self.state = State::Prelude;
                }
                self.pending = Some(span);
            }
        }
    }

    /// Inside a declaration block, a run that reaches `{` before `;` or `}` is a selector
    fn starts_nested_rule(&self, index: usize) -> bool {
        self.raws[index..]
            .iter()
            .map(|(lexeme, _)| *lexeme)
            .find(|lexeme| {
                matches!(
                    lexeme,
                    Lexeme::LeftBrace | Lexeme::RightBrace | Lexeme::Semicolon
                )
            })
            == Some(Lexeme::LeftBrace)
    }

    fn open_block(&mut self, span: Range<usize>) {
        let block = match self.state {
            State::Prelude => match self.pending_text() {
                Some(prelude) if prelude.starts_with('@') => {
                    let name = prelude
                        .split(|c: char| c.is_whitespace() || c == '(')
                        .next()
                        .unwrap_or_default()
                        .to_ascii_lowercase();
                    if NESTING_AT_RULES.contains(&name.as_str()) {
                        Block::Rules
                    } else {
                        Block::Declarations
                    }
                }
                _ => Block::Declarations,
            },
            State::Property | State::Value => Block::Declarations,
        };
        self.flush();
        self.out.push((TokenKind::CssLeftBrace, span));
        self.blocks.push(block);
        self.state = match block {
            Block::Rules => State::Prelude,
            Block::Declarations => State::Property,
        };
    }

    fn close_block(&mut self, span: Range<usize>) {
        self.flush();
        self.out.push((TokenKind::CssRightBrace, span));
        self.blocks.pop();
        self.state = match self.blocks.last() {
            Some(Block::Declarations) => State::Property,
            Some(Block::Rules) | None => State::Prelude,
        };
    }

    fn pending_text(&self) -> Option<&str> {
        self.pending.clone().map(|span| &self.source[span])
    }

    fn flush(&mut self) {
        if let Some(span) = self.pending.take() {
            let kind = match self.state {
                State::Prelude if self.source[span.clone()].starts_with('@') => TokenKind::CssAtRule,
                State::Prelude => TokenKind::CssSelector,
                State::Property => TokenKind::CssProperty,
                State::Value => TokenKind::CssValue,
            };
            self.out.push((kind, span));
        }
        self.flush_trivia();
    }

    fn flush_trivia(&mut self) {
        self.out.append(&mut self.trivia);
    }
}
