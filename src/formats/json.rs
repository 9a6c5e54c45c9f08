//! JSON output via serde_json

use super::registry::{FormatError, Formatter};
use crate::dispatch::Ast;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, ast: &Ast) -> Result<String, FormatError> {
        serde_json::to_string_pretty(ast).map_err(|e| FormatError::SerializationError(e.to_string()))
    }

    fn description(&self) -> &str {
        "The full tree, nested regions included, as JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BUILTIN;
    use crate::config::Config;
    use crate::dispatch::dispatch;
    use crate::location::Origin;
    use crate::backends::Grammar;
    use serde_json::Value;

    #[test]
    fn test_json_shape() {
        let ast = dispatch(
            "<p style=\"a:b\">",
            Grammar::Markup,
            &Config::default(),
            Origin::default(),
            &BUILTIN,
        )
        .unwrap();
        let json: Value = serde_json::from_str(&JsonFormatter.serialize(&ast).unwrap()).unwrap();

        assert_eq!(json["grammar"], "markup");
        let token = &json["tree"][0];
        assert_eq!(token["kind"], "html-tag-start");
        assert_eq!(token["detail"]["name"], "p");
        assert_eq!(token["ext"]["styleTokens"]["grammar"], "style");
        assert_eq!(token["ext"]["styleTokens"]["value"][0]["kind"], "css-property");
    }
}
