//! Source text output, produced by stringifying the tree again

use super::registry::{FormatError, Formatter};
use crate::backends::BUILTIN;
use crate::dispatch::Ast;
use crate::stringify::stringify;

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn serialize(&self, ast: &Ast) -> Result<String, FormatError> {
        stringify(ast, ast.grammar(), &BUILTIN)
            .map_err(|e| FormatError::SerializationError(e.to_string()))
    }

    fn description(&self) -> &str {
        "Source text regenerated from the tree"
    }
}
