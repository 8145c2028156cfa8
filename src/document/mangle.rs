//! Field name encoding
//!
//! A field name is the flattened document path followed by a suffix naming
//! the value kind, and for strings the analyzer:
//!
//! | kind    | suffix                 |
//! |---------|------------------------|
//! | null    | `\0_n`                 |
//! | boolean | `\0_b`                 |
//! | number  | `\0_d`                 |
//! | string  | `\u{1}<analyzer name>` |
//!
//! Analyzer names never contain control characters, so the last control
//! character in a name always starts the suffix.

use std::fmt::Write;

use crate::link::PathSegment;

pub const NULL_SUFFIX: &str = "\0_n";
pub const BOOL_SUFFIX: &str = "\0_b";
pub const NUMERIC_SUFFIX: &str = "\0_d";
pub const ANALYZER_DELIMITER: char = '\u{1}';

/// Kind of a leaf value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Null,
    Bool,
    Number,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
        }
    }
}

/// Append an object key to a path; `nested` is set when the path already
/// holds a segment, which may itself be an empty key
pub fn push_key(path: &mut String, key: &str, nested: bool) {
    if nested {
        path.push('.');
    }
    path.push_str(key);
}

/// Append a tracked array position to a path
pub fn push_index(path: &mut String, index: usize) {
    let _ = write!(path, "[{}]", index);
}

/// Render a path of segments the way a traversal names it
///
/// Every index segment is rendered; leave out the ones for untracked arrays.
pub fn render_path(path: &[PathSegment<'_>]) -> String {
    let mut rendered = String::new();
    for (i, segment) in path.iter().enumerate() {
        match segment {
            PathSegment::Key(key) => push_key(&mut rendered, key, i > 0),
            PathSegment::Index(index) => push_index(&mut rendered, *index),
        }
    }
    rendered
}

/// Append the kind suffix to `path`
pub fn mangle(path: &mut String, kind: ValueKind, analyzer: &str) {
    match kind {
        ValueKind::Null => path.push_str(NULL_SUFFIX),
        ValueKind::Bool => path.push_str(BOOL_SUFFIX),
        ValueKind::Number => path.push_str(NUMERIC_SUFFIX),
        ValueKind::String => {
            path.push(ANALYZER_DELIMITER);
            path.push_str(analyzer);
        }
    }
}

/// Full field name for a path, kind and analyzer
pub fn field_name(path: &str, kind: ValueKind, analyzer: &str) -> String {
    let mut name = String::with_capacity(path.len() + analyzer.len() + 3);
    name.push_str(path);
    mangle(&mut name, kind, analyzer);
    name
}

/// Split a field name back into path, kind and (for strings) analyzer
pub fn demangle(name: &str) -> Option<(&str, ValueKind, Option<&str>)> {
    for (suffix, kind) in [
        (NULL_SUFFIX, ValueKind::Null),
        (BOOL_SUFFIX, ValueKind::Bool),
        (NUMERIC_SUFFIX, ValueKind::Number),
    ] {
        if let Some(path) = name.strip_suffix(suffix) {
            return Some((path, kind, None));
        }
    }
    let (path, analyzer) = name.rsplit_once(ANALYZER_DELIMITER)?;
    if analyzer.chars().any(char::is_control) {
        return None;
    }
    Some((path, ValueKind::String, Some(analyzer)))
}

/// Human readable rendering, e.g. `a.b[0] (string:identity)`
pub fn display_name(name: &str) -> String {
    match demangle(name) {
        Some((path, ValueKind::String, Some(analyzer))) => {
            format!("{} (string:{})", path, analyzer)
        }
        Some((path, kind, _)) => format!("{} ({})", path, kind.as_str()),
        None => name.escape_debug().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes() {
        assert_eq!(field_name("a", ValueKind::Null, "identity"), "a\0_n");
        assert_eq!(field_name("a", ValueKind::Bool, "identity"), "a\0_b");
        assert_eq!(field_name("a", ValueKind::Number, "identity"), "a\0_d");
        assert_eq!(field_name("a", ValueKind::String, "identity"), "a\u{1}identity");
    }

    #[test]
    fn test_names_are_distinct_per_kind_and_analyzer() {
        let names = [
            field_name("a", ValueKind::Null, ""),
            field_name("a", ValueKind::Bool, ""),
            field_name("a", ValueKind::Number, ""),
            field_name("a", ValueKind::String, "identity"),
            field_name("a", ValueKind::String, "text"),
        ];
        for (i, x) in names.iter().enumerate() {
            for y in &names[i + 1..] {
                assert_ne!(x, y);
            }
        }
    }

    #[test]
    fn test_demangle() {
        assert_eq!(
            demangle("a.b[1]\u{1}text_en"),
            Some(("a.b[1]", ValueKind::String, Some("text_en")))
        );
        assert_eq!(demangle("x\0_d"), Some(("x", ValueKind::Number, None)));
        assert_eq!(demangle("plain"), None);
    }

    #[test]
    fn test_render_path() {
        use PathSegment::{Index, Key};
        assert_eq!(render_path(&[Key("a"), Index(0), Key("b")]), "a[0].b");
        assert_eq!(render_path(&[]), "");
        assert_eq!(render_path(&[Key(""), Key("b")]), ".b");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("a\u{1}identity"), "a (string:identity)");
        assert_eq!(display_name("a\0_b"), "a (bool)");
    }
}
