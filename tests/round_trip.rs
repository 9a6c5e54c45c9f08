//! Property-based round-trip tests: parsing then stringifying returns the input unchanged.

use proptest::prelude::*;
use weft::{parse_to_ast, stringify_ast, Config, JsTemplateConfig, SourceFile, TemplateConfig};

const MARKUP_PIECES: &[&str] = &[
    "<p>",
    "</p>",
    "plain text ",
    "a < b",
    "\n",
    "{%$name|escape%}",
    "{%if $a%}",
    "{%/if%}",
    "<!-- note -->",
    "<!DOCTYPE html>",
    "<br/>",
    "<a href=\"/x?a=1&b=2\" style=\"color: red; top:0\">",
    "<img src='{%$src%}' {%if $alt%}alt=\"{%$alt%}\"{%/if%} >",
    "<div STYLE = 'margin:0 auto;padding:{%$p%}px'>",
    "<style>\na { color: red }\n@media print { b { x: y } }\n</style>",
    "<script type=\"text/template\"><li style=\"x:y\"><%$i%></li><style>i{}</style></script>",
    "<script type=\"text/javascript\">if (a < b) { c(); }</script>",
    "<script>var s = '</p>';</script>",
];

const STYLE_PIECES: &[&str] = &[
    "a{b:c}",
    ".x > y { margin: 0 auto; }",
    "/* comment */",
    "\n",
    " ",
    "@import 'a.css';",
    "@media screen and (min-width: 10px) { p { color: {%$c%} } }",
    "div:hover::after { content: \"}\" }",
];

const SCRIPT_PIECES: &[&str] = &[
    "var a = 1;",
    "\n",
    "f(a, [b, {c: d}]);",
    "x = y / z / 2;",
    "if (/ab+c/i.test(s)) { t(); }",
    "// line comment\n",
    "/* block */",
    "s = `multi\nline ${v}`;",
    "'single' + \"double\";",
];

fn document(pieces: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(pieces), 0..12).prop_map(|parts| parts.concat())
}

fn config() -> Config {
    Config::default().with_js_tpl(JsTemplateConfig::new(
        ["text/template"],
        TemplateConfig::new("smarty", "<%", "%>"),
    ))
}

fn round_trip(source: &str, file: &SourceFile) -> String {
    let config = config();
    let ast = parse_to_ast(source, file, &config).expect("parse");
    stringify_ast(&ast, file, &config).expect("stringify")
}

proptest! {
    #[test]
    fn markup_round_trips(source in document(MARKUP_PIECES)) {
        prop_assert_eq!(round_trip(&source, &SourceFile::new("page.html").template()), source);
    }

    #[test]
    fn style_round_trips(source in document(STYLE_PIECES)) {
        prop_assert_eq!(round_trip(&source, &SourceFile::new("site.css")), source);
    }

    #[test]
    fn script_round_trips(source in document(SCRIPT_PIECES)) {
        prop_assert_eq!(round_trip(&source, &SourceFile::new("app.js")), source);
    }
}
