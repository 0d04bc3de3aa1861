// In-memory representation of a Boost INFO document

use super::parser::{self, InfoError, Result};
use std::fmt;
use std::fs;
use std::path::Path;

/// A node in an INFO document
///
/// Each node carries an optional value and an ordered list of named
/// children. Keys may repeat, so children are kept as a list rather than a
/// map; lookups by key return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoTree {
    value: Option<String>,
    children: Vec<(String, InfoTree)>,
}

impl InfoTree {
    /// Create an empty node with no value
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a leaf node holding a value
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    /// Parse an INFO document from text
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse_document(text)
    }

    /// Read and parse an INFO document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Write the document back out in INFO syntax
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_string()).map_err(InfoError::Io)
    }

    /// The value attached to this node, if any
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    /// All children in document order
    pub fn children(&self) -> impl Iterator<Item = (&str, &InfoTree)> {
        self.children.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a child and return a mutable reference to it
    pub fn push(&mut self, key: impl Into<String>, child: InfoTree) -> &mut InfoTree {
        self.children.push((key.into(), child));
        let last = self.children.len() - 1;
        &mut self.children[last].1
    }

    /// First child with the given key
    pub fn get(&self, key: &str) -> Option<&InfoTree> {
        self.children.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    /// Every child with the given key, in document order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a InfoTree> {
        self.children
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, t)| t)
    }

    /// Value of the first child with the given key
    pub fn child_value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|t| t.value())
    }

    /// Distinct child keys in first-seen order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.children {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    /// Resolve a slash-separated path such as `ensemble/id`
    ///
    /// Repeated keys fan out, so every matching node is returned.
    pub fn get_path(&self, path: &str) -> Vec<&InfoTree> {
        let mut current: Vec<&InfoTree> = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|node| {
                    node.children
                        .iter()
                        .filter(|(k, _)| k == segment)
                        .map(|(_, t)| t)
                })
                .collect();
        }
        current
    }

    /// Remove and return the last child (used while building the tree)
    pub(crate) fn pop(&mut self) -> Option<(String, InfoTree)> {
        self.children.pop()
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut InfoTree> {
        self.children.last_mut().map(|(_, t)| t)
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        for (key, child) in &self.children {
            if key.is_empty() || key.contains(|c: char| parser::is_delimiter(c)) {
                write!(f, "{}{}", pad, quote(key))?;
            } else {
                write!(f, "{}{}", pad, key)?;
            }
            if let Some(value) = &child.value {
                write!(f, " {}", quote(value))?;
            }
            writeln!(f)?;
            if !child.children.is_empty() {
                writeln!(f, "{}{{", pad)?;
                child.write_indented(f, indent + 2)?;
                writeln!(f, "{}}}", pad)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for InfoTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Quote a value so that it survives a round trip through the parser
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
