//! Built-in script backend
//!
//! Script files are parsed into an opaque [`ScriptTree`]. The tree only knows about lexical
//! tokens and bracket nesting, which is enough to reject malformed input (unbalanced
//! brackets, unterminated strings and comments) and to regenerate the exact source text.
//! Nothing in the composition pipeline ever looks inside it.
//!
//! Comments, strings and regular expression literals start with a character logos hands
//! back as a single token; their extent is measured by hand so the lexer never has to
//! backtrack.

use super::{Grammar, ScriptBackend};
use crate::error::BackendError;
use crate::location::SourceLocation;
use logos::Logos;
use serde::Serialize;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    #[regex(r"\s+")]
    Whitespace,

    #[regex(r"[\p{L}_$][\p{L}\p{N}_$]*")]
    Ident,

    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    Number,

    #[regex(r#"["'`]"#)]
    Quote,

    #[token("/")]
    Slash,

    #[regex(r"[(\[{]")]
    Open,

    #[regex(r"[)\]}]")]
    Close,

    #[regex(r#"[^\s\p{L}\p{N}_$"'`/()\[\]{}]"#)]
    Punct,
}

/// Kind of a leaf in the script tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptKind {
    Whitespace,
    Comment,
    Ident,
    Number,
    Str,
    Template,
    Regex,
    Punct,
}

/// Node of the opaque script tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ScriptNode {
    Leaf {
        kind: ScriptKind,
        text: String,
    },
    Group {
        open: char,
        body: Vec<ScriptNode>,
        close: char,
    },
}

/// Opaque parse result of a script file
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScriptTree {
    pub body: Vec<ScriptNode>,
}

impl ScriptTree {
    /// Number of leaves and groups in the tree
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[ScriptNode]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    ScriptNode::Leaf { .. } => 1,
                    ScriptNode::Group { body, .. } => 1 + count(body),
                })
                .sum()
        }
        count(&self.body)
    }
}

/// Keywords after which a slash starts a regular expression
const REGEX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// The built-in script parser and generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptParser;

impl ScriptBackend for ScriptParser {
    fn parse(&self, source: &str) -> Result<ScriptTree, BackendError> {
        parse(source)
    }

    fn generate(&self, tree: &ScriptTree) -> Result<String, BackendError> {
        Ok(generate(tree))
    }
}

/// Regenerate source text from a tree
pub fn generate(tree: &ScriptTree) -> String {
    fn emit(nodes: &[ScriptNode], out: &mut String) {
        for node in nodes {
            match node {
                ScriptNode::Leaf { text, .. } => out.push_str(text),
                ScriptNode::Group { open, body, close } => {
                    out.push(*open);
                    emit(body, out);
                    out.push(*close);
                }
            }
        }
    }

    let mut out = String::new();
    emit(&tree.body, &mut out);
    out
}

struct Frame {
    open: char,
    start: usize,
    body: Vec<ScriptNode>,
}

pub fn parse(source: &str) -> Result<ScriptTree, BackendError> {
    let locator = SourceLocation::new(source);
    let error = |message: String, at: usize| {
        BackendError::new(Grammar::Script, message).at(locator.byte_to_position(at))
    };

    let mut lexer = Lexeme::lexer(source);
    let mut stack: Vec<Frame> = Vec::new();
    let mut body: Vec<ScriptNode> = Vec::new();
    // Whether a slash here would start a regular expression
    let mut expects_operand = true;

    while let Some(result) = lexer.next() {
        let start = lexer.span().start;
        let lexeme = result.map_err(|_| error(format!("unexpected input {:?}", lexer.slice()), start))?;

        let kind = match lexeme {
            Lexeme::Whitespace => ScriptKind::Whitespace,
            Lexeme::Ident => ScriptKind::Ident,
            Lexeme::Number => ScriptKind::Number,
            Lexeme::Punct => ScriptKind::Punct,
            Lexeme::Quote => {
                let quote = lexer.slice().as_bytes()[0];
                let len = string_len(lexer.remainder().as_bytes(), quote)
                    .ok_or_else(|| error("unterminated string".to_string(), start))?;
                lexer.bump(len);
                if quote == b'`' {
                    ScriptKind::Template
                } else {
                    ScriptKind::Str
                }
            }
            Lexeme::Slash => {
                let rest = lexer.remainder();
                if rest.starts_with('/') {
                    lexer.bump(rest.find('\n').unwrap_or(rest.len()));
                    ScriptKind::Comment
                } else if let Some(body) = rest.strip_prefix('*') {
                    let close = body
                        .find("*/")
                        .ok_or_else(|| error("unclosed comment".to_string(), start))?;
                    lexer.bump(1 + close + 2);
                    ScriptKind::Comment
                } else if expects_operand {
                    let len = regex_len(rest.as_bytes())
                        .ok_or_else(|| error("unterminated regular expression".to_string(), start))?;
                    lexer.bump(len);
                    ScriptKind::Regex
                } else {
                    ScriptKind::Punct
                }
            }
            Lexeme::Open => {
                let open = lexer.slice().chars().next().unwrap_or('(');
                stack.push(Frame {
                    open,
                    start,
                    body: std::mem::take(&mut body),
                });
                expects_operand = true;
                continue;
            }
            Lexeme::Close => {
                let close = lexer.slice().chars().next().unwrap_or(')');
                let frame = stack
                    .pop()
                    .ok_or_else(|| error(format!("unexpected '{close}'"), start))?;
                if closing_for(frame.open) != close {
                    return Err(error(
                        format!("'{}' closed by '{close}'", frame.open),
                        start,
                    ));
                }
                let inner = std::mem::replace(&mut body, frame.body);
                body.push(ScriptNode::Group {
                    open: frame.open,
                    body: inner,
                    close,
                });
                expects_operand = false;
                continue;
            }
        };

        let text = lexer.slice();
        match kind {
            ScriptKind::Whitespace | ScriptKind::Comment => {}
            ScriptKind::Ident => expects_operand = REGEX_KEYWORDS.contains(&text),
            ScriptKind::Punct => expects_operand = true,
            _ => expects_operand = false,
        }
        body.push(ScriptNode::Leaf {
            kind,
            text: text.to_string(),
        });
    }

    if let Some(frame) = stack.pop() {
        return Err(error(format!("unclosed '{}'", frame.open), frame.start));
    }

    Ok(ScriptTree { body })
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Bytes up to and including the closing quote. Only template literals may span lines.
fn string_len(bytes: &[u8], quote: u8) -> Option<usize> {
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'\n' if quote != b'`' => return None,
            b if b == quote => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

/// Bytes of a regular expression literal after its opening slash, flags included
fn regex_len(bytes: &[u8]) -> Option<usize> {
    let mut pos = 0;
    let mut in_class = false;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'\n' => return None,
            b'[' => {
                in_class = true;
                pos += 1;
            }
            b']' => {
                in_class = false;
                pos += 1;
            }
            b'/' if !in_class => {
                pos += 1;
                while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
                    pos += 1;
                }
                return Some(pos);
            }
            _ => pos += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position;

    #[test]
    fn test_round_trip_preserves_source() {
        let source = "function f(a, b) {\n  // add\n  return a / b + /x[/]y/g.test('s') ? `t${a}` : \"q\";\n}\n";
        let tree = parse(source).expect("parse");
        assert_eq!(generate(&tree), source);
    }

    #[test]
    fn test_groups_nest() {
        let tree = parse("a[b(c)]").expect("parse");
        assert_eq!(tree.body.len(), 2);
        match &tree.body[1] {
            ScriptNode::Group { open, body, close } => {
                assert_eq!((*open, *close), ('[', ']'));
                assert!(matches!(body[1], ScriptNode::Group { open: '(', .. }));
            }
            other => panic!("expected group, got {:?}", other),
        }
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_division_is_not_regex() {
        let tree = parse("x = a / b / c").expect("parse");
        let regexes = tree
            .body
            .iter()
            .filter(|node| matches!(node, ScriptNode::Leaf { kind: ScriptKind::Regex, .. }))
            .count();
        assert_eq!(regexes, 0);
    }

    #[test]
    fn test_unbalanced_brackets_fail() {
        let err = parse("if (a) {\n  b(];\n}").unwrap_err();
        assert_eq!(err.grammar, Grammar::Script);
        assert_eq!(err.message, "'(' closed by ']'");
        assert_eq!(err.position, Some(Position::new(1, 4)));

        let err = parse("call(").unwrap_err();
        assert_eq!(err.message, "unclosed '('");
        assert_eq!(err.position, Some(Position::new(0, 4)));

        let err = parse("}").unwrap_err();
        assert_eq!(err.message, "unexpected '}'");
    }

    #[test]
    fn test_unterminated_literals_fail() {
        assert_eq!(parse("'abc\n'").unwrap_err().message, "unterminated string");
        assert_eq!(parse("/* open").unwrap_err().message, "unclosed comment");
        assert!(parse("`multi\nline`").is_ok());
    }
}
