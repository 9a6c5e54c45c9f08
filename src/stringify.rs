//! Stringification engine
//!
//! The inverse of [`dispatch`](crate::dispatch::dispatch). Script trees and style tokens go
//! straight to their backend. Markup goes to the markup stringifier together with the
//! callbacks it needs for the style and script payloads embedded in it; nested markup is
//! handled by the markup stringifier itself.

use crate::backends::script::ScriptTree;
use crate::backends::{Grammar, GrammarRegistry, StringifyCallbacks};
use crate::dispatch::Ast;
use crate::error::BackendError;
use crate::token::Token;
use tracing::debug;

/// Turn `ast` back into text, expecting it to be a `grammar` tree
pub fn stringify(
    ast: &Ast,
    grammar: Grammar,
    registry: &GrammarRegistry,
) -> Result<String, BackendError> {
    debug!(%grammar, "stringify");

    match (grammar, ast) {
        (Grammar::Script, Ast::Script(tree)) => registry.script().generate(tree),
        (Grammar::Style, Ast::Style(tokens)) => registry.style().stringify(tokens),
        (Grammar::Markup, Ast::Markup(tokens)) => {
            let script =
                |tree: &ScriptTree| -> Result<String, BackendError> { registry.script().generate(tree) };
            let style =
                |tokens: &[Token]| -> Result<String, BackendError> { registry.style().stringify(tokens) };
            registry.markup().stringify(
                tokens,
                &StringifyCallbacks {
                    script: &script,
                    style: &style,
                },
            )
        }
        (expected, ast) => Err(BackendError::new(
            expected,
            format!("expected a {expected} tree, got a {} tree", ast.grammar()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BUILTIN;
    use crate::config::Config;
    use crate::dispatch::dispatch;
    use crate::location::Origin;
    use rstest::rstest;

    #[rstest]
    #[case(Grammar::Script, "if (a) { b(/x/g, 'c'); }\n")]
    #[case(Grammar::Style, "@media print {\n  a { color: red }\n}\n")]
    #[case(Grammar::Markup, "<div style=\"top: 0\"><style>p{x:y}</style>{%$v%}</div>")]
    fn test_round_trip(#[case] grammar: Grammar, #[case] source: &str) {
        let ast = dispatch(source, grammar, &Config::default(), Origin::default(), &BUILTIN)
            .expect("dispatch");
        assert_eq!(stringify(&ast, grammar, &BUILTIN).expect("stringify"), source);
    }

    #[test]
    fn test_grammar_mismatch_is_an_error() {
        let ast = Ast::Style(Vec::new());
        let err = stringify(&ast, Grammar::Script, &BUILTIN).unwrap_err();
        assert_eq!(err.grammar, Grammar::Script);
        assert_eq!(err.message, "expected a script tree, got a style tree");
    }
}
