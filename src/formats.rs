//! Output formats for parsed documents
//!
//! - `text`: the document stringified back to source text
//! - `json`: the full tree as JSON
//! - `treeviz`: one line per token, nested regions indented under their owners

pub mod json;
pub mod registry;
pub mod text;
pub mod treeviz;

pub use json::JsonFormatter;
pub use registry::{FormatError, FormatRegistry, Formatter};
pub use text::TextFormatter;
pub use treeviz::{to_treeviz_str, TreevizFormatter};
