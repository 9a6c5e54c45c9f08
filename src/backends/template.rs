//! Template region scanning
//!
//! Both the markup and style tokenizers treat text between the configured left and right
//! delimiters as a single opaque `Tpl` token. How far a region extends is decided by a
//! [`TemplateAdapter`]. An adapter supplied in the [`TemplateConfig`] wins, then one
//! registered on the tokenizer under the configured engine name, and finally
//! [`DelimitedAdapter`].

use crate::config::TemplateConfig;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decides the extent of a template region
pub trait TemplateAdapter: Send + Sync + fmt::Debug {
    /// Byte length of the template region at the start of `source`, which begins with
    /// `ld`. `None` when the region never closes.
    fn scan(&self, source: &str, ld: &str, rd: &str) -> Option<usize>;
}

/// Ends at the first right delimiter that is not inside a quoted string
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedAdapter;

impl TemplateAdapter for DelimitedAdapter {
    fn scan(&self, source: &str, ld: &str, rd: &str) -> Option<usize> {
        let bytes = source.as_bytes();
        let mut pos = ld.len();
        while pos < bytes.len() {
            if bytes[pos..].starts_with(rd.as_bytes()) {
                return Some(pos + rd.len());
            }
            match bytes[pos] {
                quote @ (b'"' | b'\'') => match closing_quote(bytes, pos + 1, quote) {
                    Some(end) => pos = end + 1,
                    // A stray apostrophe inside a template comment; stop honouring quotes.
                    None => return source[ld.len()..].find(rd).map(|i| ld.len() + i + rd.len()),
                },
                _ => pos += 1,
            }
        }
        None
    }
}

fn closing_quote(bytes: &[u8], mut pos: usize, quote: u8) -> Option<usize> {
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b if b == quote => return Some(pos),
            _ => pos += 1,
        }
    }
    None
}

/// Balances nested delimiter pairs, for engines such as `{ ... { ... } ... }`
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedAdapter;

impl TemplateAdapter for NestedAdapter {
    fn scan(&self, source: &str, ld: &str, rd: &str) -> Option<usize> {
        let mut depth = 0usize;
        let mut pos = 0;
        while pos < source.len() {
            let rest = &source[pos..];
            if rest.starts_with(ld) {
                depth += 1;
                pos += ld.len();
            } else if rest.starts_with(rd) {
                depth = depth.saturating_sub(1);
                pos += rd.len();
                if depth == 0 {
                    return Some(pos);
                }
            } else {
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
        None
    }
}

/// Adapters registered per template engine name
#[derive(Debug, Clone, Default)]
pub struct TemplateAdapters {
    adapters: HashMap<String, Arc<dyn TemplateAdapter>>,
}

impl TemplateAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one for the same engine
    pub fn register(&mut self, engine: impl Into<String>, adapter: Arc<dyn TemplateAdapter>) {
        self.adapters.insert(engine.into(), adapter);
    }

    pub fn get(&self, engine: &str) -> Option<&Arc<dyn TemplateAdapter>> {
        self.adapters.get(engine)
    }

    pub fn has(&self, engine: &str) -> bool {
        self.adapters.contains_key(engine)
    }

    /// Build the scanner used for one tokenizer run
    pub fn scanner<'a>(&'a self, config: &'a TemplateConfig) -> TemplateScanner<'a> {
        let adapter: &'a dyn TemplateAdapter = match (&config.adapter, self.get(&config.engine)) {
            (Some(adapter), _) => adapter.as_ref(),
            (None, Some(adapter)) => adapter.as_ref(),
            (None, None) => &DelimitedAdapter,
        };
        TemplateScanner {
            ld: &config.ld,
            rd: &config.rd,
            adapter,
        }
    }
}

/// Template delimiters bound to the adapter that measures regions
#[derive(Clone, Copy)]
pub struct TemplateScanner<'a> {
    ld: &'a str,
    rd: &'a str,
    adapter: &'a dyn TemplateAdapter,
}

impl<'a> TemplateScanner<'a> {
    /// Check if a template region opens at the start of `rest`
    pub fn opens(&self, rest: &str) -> bool {
        !self.ld.is_empty() && !self.rd.is_empty() && rest.starts_with(self.ld)
    }

    /// Byte length of the region opening at the start of `rest`
    pub fn scan(&self, rest: &str) -> Option<usize> {
        self.adapter.scan(rest, self.ld, self.rd)
    }

    /// Byte offset of the next region opening in `rest`
    pub fn next_open(&self, rest: &str) -> Option<usize> {
        if self.ld.is_empty() || self.rd.is_empty() {
            return None;
        }
        rest.find(self.ld)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{%$a%}rest", Some(6))]
    #[case("{%$a|default:\"%}\"%} tail", Some(19))]
    #[case("{%* it's here *%}", Some(17))]
    #[case("{%unclosed", None)]
    fn test_delimited_adapter(#[case] source: &str, #[case] expected: Option<usize>) {
        assert_eq!(DelimitedAdapter.scan(source, "{%", "%}"), expected);
    }

    #[test]
    fn test_nested_adapter_balances() {
        let source = "{ a { b } c } d";
        assert_eq!(NestedAdapter.scan(source, "{", "}"), Some(13));
        assert_eq!(DelimitedAdapter.scan(source, "{", "}"), Some(9));
        assert_eq!(NestedAdapter.scan("{ a { b }", "{", "}"), None);
    }

    #[test]
    fn test_config_adapter_overrides_registered() {
        let mut adapters = TemplateAdapters::new();
        adapters.register("curly", Arc::new(DelimitedAdapter));
        assert!(adapters.has("curly"));

        let mut config = TemplateConfig {
            engine: "curly".into(),
            ld: "{".into(),
            rd: "}".into(),
            adapter: None,
        };
        assert_eq!(adapters.scanner(&config).scan("{a{b}c}"), Some(5));

        config.adapter = Some(Arc::new(NestedAdapter));
        assert_eq!(adapters.scanner(&config).scan("{a{b}c}"), Some(7));
    }

    #[test]
    fn test_empty_delimiters_disable_templates() {
        let adapters = TemplateAdapters::new();
        let config = TemplateConfig {
            engine: String::new(),
            ld: String::new(),
            rd: String::new(),
            adapter: None,
        };
        let scanner = adapters.scanner(&config);
        assert!(!scanner.opens("{%x%}"));
        assert_eq!(scanner.next_open("a{%x%}"), None);
    }
}
