//! # weft
//!
//! Parse documents that mix markup, style and script into one tree, and turn that tree back
//! into text.
//!
//! Markup may embed style (`style` attributes and `<style>` blocks) and script
//! (`<script>` blocks). Script blocks whose declared type is a configured template dialect
//! are themselves markup templates, which can embed further style and script, to any depth.
//!
//! Layout
//!
//!     src/
//!       ├── backends     One tokenizer/parser and stringifier per grammar, plus template
//!       │                region scanning shared by markup and style
//!       ├── dispatch     Text to tree, per grammar
//!       ├── embed        Finds embedded regions in markup and attaches their trees
//!       ├── stringify    Tree to text
//!       ├── pipeline     `parse_to_ast` / `stringify_ast`, keyed on the file descriptor
//!       └── formats      Output formats for the CLI
//!
//! ```ignore
//! use weft::{parse_to_ast, stringify_ast, Config, SourceFile};
//!
//! let file = SourceFile::new("page.tpl").template();
//! let ast = parse_to_ast(source, &file, &Config::default())?;
//! assert_eq!(stringify_ast(&ast, &file, &Config::default())?, source);
//! ```

pub mod backends;
pub mod config;
pub mod dispatch;
pub mod embed;
pub mod error;
pub mod file;
pub mod formats;
pub mod location;
pub mod pipeline;
pub mod stringify;
pub mod token;

pub use backends::{Grammar, GrammarRegistry};
pub use crate::config::{Config, JsTemplateConfig, Loader, TemplateConfig};
pub use dispatch::Ast;
pub use error::{BackendError, Error, Result};
pub use file::{FileDescriptor, FileKind, SourceFile};
pub use pipeline::{parse_to_ast, parse_to_ast_with, stringify_ast, stringify_ast_with};
pub use token::{ExtKey, ExtValue, Token, TokenKind};
