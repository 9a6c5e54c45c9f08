//! Public entry points
//!
//! [`parse_to_ast`] and [`stringify_ast`] detect the grammar of a file from its descriptor
//! and hand the work to the dispatcher or the stringification engine. Both use the
//! built-in backends; the `_with` variants take a custom [`GrammarRegistry`].

use crate::backends::{GrammarRegistry, BUILTIN};
use crate::config::Config;
use crate::dispatch::{dispatch, Ast};
use crate::error::{Operation, Result};
use crate::file::{FileDescriptor, FileKind};
use crate::location::Origin;
use crate::stringify::stringify;

/// Parse `content`, the text of `file`
pub fn parse_to_ast(content: &str, file: &dyn FileDescriptor, config: &Config) -> Result<Ast> {
    parse_to_ast_with(content, file, config, &BUILTIN)
}

pub fn parse_to_ast_with(
    content: &str,
    file: &dyn FileDescriptor,
    config: &Config,
    registry: &GrammarRegistry,
) -> Result<Ast> {
    let kind = FileKind::detect(file, Operation::Parse)?;
    Ok(dispatch(content, kind.grammar(), config, Origin::default(), registry)?)
}

/// Turn the tree of `file` back into text
pub fn stringify_ast(ast: &Ast, file: &dyn FileDescriptor, config: &Config) -> Result<String> {
    stringify_ast_with(ast, file, config, &BUILTIN)
}

/// `config` is accepted for symmetry with [`parse_to_ast_with`]; trees carry everything
/// stringification needs.
pub fn stringify_ast_with(
    ast: &Ast,
    file: &dyn FileDescriptor,
    _config: &Config,
    registry: &GrammarRegistry,
) -> Result<String> {
    let kind = FileKind::detect(file, Operation::Stringify)?;
    Ok(stringify(ast, kind.grammar(), registry)?)
}
