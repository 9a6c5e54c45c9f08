//! File descriptors and grammar detection
//!
//! The pipeline never reads files itself. It only asks a [`FileDescriptor`] for the file's
//! extension and whether it carries the `tpl` property, and derives a [`FileKind`] from
//! those two answers. Markup files are recognized by the property rather than the
//! extension, since template files come with all kinds of extensions.

use crate::backends::Grammar;
use crate::error::{Error, Operation, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Property that flags a file as a markup template
pub const TPL_PROPERTY: &str = "tpl";

/// Read-only view of a file
pub trait FileDescriptor {
    /// Path used in diagnostics
    fn path(&self) -> &str;

    /// Extension without the leading dot, in any case
    fn extension(&self) -> &str;

    fn has_property(&self, name: &str) -> bool;
}

/// A plain in-memory file descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: String,
    extension: String,
    properties: BTreeSet<String>,
}

impl SourceFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path: PathBuf = path.as_ref().to_path_buf();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_string();
        Self {
            path: path.to_string_lossy().into_owned(),
            extension,
            properties: BTreeSet::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.properties.insert(name.into());
        self
    }

    /// Shorthand for flagging the file as a markup template
    pub fn template(self) -> Self {
        self.with_property(TPL_PROPERTY)
    }
}

impl FileDescriptor for SourceFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn has_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }
}

/// Top-level grammar of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Script,
    Style,
    Markup,
}

impl FileKind {
    /// Detect the grammar of `file`. `js` and `css` win over the template flag.
    pub fn detect(file: &dyn FileDescriptor, operation: Operation) -> Result<FileKind> {
        match file.extension().to_ascii_lowercase().as_str() {
            "js" => Ok(FileKind::Script),
            "css" => Ok(FileKind::Style),
            _ if file.has_property(TPL_PROPERTY) => Ok(FileKind::Markup),
            _ => Err(Error::UnsupportedFileKind {
                path: file.path().to_string(),
                operation,
            }),
        }
    }

    pub fn grammar(&self) -> Grammar {
        match self {
            FileKind::Script => Grammar::Script,
            FileKind::Style => Grammar::Style,
            FileKind::Markup => Grammar::Markup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SourceFile::new("app.js"), FileKind::Script)]
    #[case(SourceFile::new("APP.JS").template(), FileKind::Script)]
    #[case(SourceFile::new("site.Css"), FileKind::Style)]
    #[case(SourceFile::new("page.html").template(), FileKind::Markup)]
    #[case(SourceFile::new("page.tpl").template(), FileKind::Markup)]
    #[case(SourceFile::new("README").template(), FileKind::Markup)]
    fn test_detect(#[case] file: SourceFile, #[case] expected: FileKind) {
        assert_eq!(FileKind::detect(&file, Operation::Parse).unwrap(), expected);
    }

    #[rstest]
    #[case("notes.txt")]
    #[case("page.html")]
    #[case("Makefile")]
    fn test_detect_rejects_unflagged(#[case] path: &str) {
        let file = SourceFile::new(path);
        match FileKind::detect(&file, Operation::Parse) {
            Err(Error::UnsupportedFileKind { path: reported, operation }) => {
                assert_eq!(reported, path);
                assert_eq!(operation, Operation::Parse);
            }
            other => panic!("expected UnsupportedFileKind, got {:?}", other),
        }
    }

    #[test]
    fn test_source_file_properties() {
        let file = SourceFile::new("a/b.tpl").with_property("inline");
        assert_eq!(file.extension(), "tpl");
        assert_eq!(file.path(), "a/b.tpl");
        assert!(file.has_property("inline"));
        assert!(!file.has_property(TPL_PROPERTY));
    }
}
