//! Treeviz formatter for parsed documents
//!
//! One line per node, nesting drawn with box characters:
//!
//!     <prefix><connector> <icon> <label>
//!
//! Token labels are the token kind, its start position and its text (escaped, truncated to
//! 30 characters). Extension slots show up as children of their token, named after their
//! key, with the attached payload below them.
//!
//! Icons
//!     Document: ⧉
//!     Tags: ◇    Style/script blocks: ▣    Text: ◦    Comments: ✎    Doctype: !
//!     Template regions: ⟦    Style tokens: ·    Extension slots: ↳    Script trees: ƒ

use super::registry::{FormatError, Formatter};
use crate::backends::script::ScriptTree;
use crate::dispatch::Ast;
use crate::token::{ExtValue, Token, TokenKind};

struct Node {
    icon: &'static str,
    label: String,
    children: Vec<Node>,
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn get_icon(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::HtmlTagStart | TokenKind::HtmlTagEnd => "◇",
        TokenKind::HtmlTagStyle | TokenKind::HtmlTagScript => "▣",
        TokenKind::HtmlText => "◦",
        TokenKind::HtmlComment | TokenKind::CssComment => "✎",
        TokenKind::HtmlDoctype => "!",
        TokenKind::Tpl => "⟦",
        _ => "·",
    }
}

fn script_node(tree: &ScriptTree) -> Node {
    Node {
        icon: "ƒ",
        label: format!("script tree ({} nodes)", tree.node_count()),
        children: Vec::new(),
    }
}

fn token_node(token: &Token) -> Node {
    let text = token.value.escape_debug().to_string();
    let children = token
        .ext
        .iter()
        .map(|(key, value)| {
            let (label, children) = match value {
                ExtValue::Token(token) => (key.as_str().to_string(), vec![token_node(token)]),
                ExtValue::Markup(tokens) | ExtValue::Style(tokens) => (
                    format!("{} ({} tokens)", key.as_str(), tokens.len()),
                    tokens.iter().map(token_node).collect(),
                ),
                ExtValue::Script(tree) => (key.as_str().to_string(), vec![script_node(tree)]),
                ExtValue::Text(text) => (format!("{} = {}", key.as_str(), text), Vec::new()),
            };
            Node {
                icon: "↳",
                label,
                children,
            }
        })
        .collect();

    Node {
        icon: get_icon(token.kind),
        label: format!("{} {} {}", token.kind, token.range.start, truncate(&text, 30)),
        children,
    }
}

fn format_node(node: &Node, prefix: &str, is_last: bool, output: &mut String) {
    let connector = if is_last { "└─" } else { "├─" };
    output.push_str(&format!("{}{} {} {}\n", prefix, connector, node.icon, node.label));

    let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        format_node(child, &child_prefix, i == count - 1, output);
    }
}

pub fn to_treeviz_str(ast: &Ast) -> String {
    let children: Vec<Node> = match ast {
        Ast::Markup(tokens) | Ast::Style(tokens) => tokens.iter().map(token_node).collect(),
        Ast::Script(tree) => vec![script_node(tree)],
    };

    let mut output = format!("⧉ {}\n", ast.grammar());
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        format_node(child, "", i == count - 1, &mut output);
    }
    output
}

/// Formatter implementation for treeviz format
pub struct TreevizFormatter;

impl Formatter for TreevizFormatter {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn serialize(&self, ast: &Ast) -> Result<String, FormatError> {
        Ok(to_treeviz_str(ast))
    }

    fn description(&self) -> &str {
        "Visual tree representation with indentation and Unicode icons"
    }
}
