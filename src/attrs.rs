//! Attribute maps and their global → module → rule layering.
//!
//! Attributes are keyed by their keyword text with a leading colon, so the
//! notation entry `:cflags ["-O2"]` is stored under `":cflags"`. Merging is a
//! shallow overwrite: a key set at a narrower scope replaces the wider value
//! outright. Every merge returns a fresh map and leaves its base untouched,
//! which keeps rules isolated from each other.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::eden::{Document, NodeKind, NodeRef};

/// Prefix applied to keyword keys when they are stored.
pub const KEY_PREFIX: char = ':';

/// Errors raised while merging or querying attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum AttrError {
    /// An attribute scope was not written as a map.
    #[error("attributes must be a map, found a {found}")]
    #[diagnostic(code(aa::attrs::not_a_map))]
    NotAMap {
        /// Kind of the offending node.
        found: NodeKind,
    },
    /// A map key was not a keyword.
    #[error("map key is expected to be a keyword, found a {found}")]
    #[diagnostic(code(aa::attrs::key_not_keyword))]
    KeyNotKeyword {
        /// Kind of the offending key.
        found: NodeKind,
    },
    /// A map held an odd number of elements.
    #[error("map key `{key}` found without a value")]
    #[diagnostic(
        code(aa::attrs::missing_value),
        help("maps hold an even number of elements: alternating keys and values")
    )]
    MissingValue {
        /// The key left dangling.
        key: String,
    },
    /// A required attribute is absent.
    #[error("{key} key not found")]
    #[diagnostic(code(aa::attrs::missing))]
    Missing {
        /// The absent key.
        key: String,
    },
    /// An attribute holds a value of the wrong kind.
    #[error("{key} has the wrong type: expected {expected}, found {found}")]
    #[diagnostic(code(aa::attrs::wrong_type))]
    WrongType {
        /// The offending key.
        key: String,
        /// Description of the accepted shapes.
        expected: &'static str,
        /// Kind of the value found.
        found: NodeKind,
    },
}

/// Insertion-ordered attribute map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attributes(IndexMap<String, Document>);

impl Attributes {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the global scope from a defaults document.
    ///
    /// An empty document yields no attributes. Otherwise the first form must
    /// be a map; any further forms are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`AttrError`] when the first form is not a well-formed map.
    pub fn from_defaults(doc: &Document) -> Result<Self, AttrError> {
        let mut forms = doc.forms();
        let Some(first) = forms.next() else {
            return Ok(Self::new());
        };
        let global = Self::new().merged(first)?;
        let extra = forms.count();
        if extra > 0 {
            warn!(extra, "ignoring forms after the defaults map");
        }
        Ok(global)
    }

    /// Return a copy of `self` overlaid with the entries of `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`AttrError::NotAMap`] when `scope` is not a map,
    /// [`AttrError::KeyNotKeyword`] for a non-keyword key and
    /// [`AttrError::MissingValue`] for an odd element count.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa::attrs::Attributes;
    /// use aa::eden::read;
    ///
    /// let global = read("{:cc \"gcc\" :opt 1}").expect("defaults");
    /// let module = read("{:opt 2}").expect("module");
    /// let base = Attributes::new()
    ///     .merged(global.forms().next().expect("map"))
    ///     .expect("global");
    /// let merged = base.merged(module.forms().next().expect("map")).expect("module");
    /// assert_eq!(merged.get(":opt").and_then(|v| v.as_int()), Some(2));
    /// assert_eq!(base.get(":opt").and_then(|v| v.as_int()), Some(1));
    /// ```
    pub fn merged(&self, scope: NodeRef<'_>) -> Result<Self, AttrError> {
        if scope.kind() != NodeKind::Map {
            return Err(AttrError::NotAMap {
                found: scope.kind(),
            });
        }
        let mut merged = self.clone();
        for (key, value) in scope.pairs() {
            let Some(name) = key.as_keyword() else {
                return Err(AttrError::KeyNotKeyword { found: key.kind() });
            };
            let stored = format!("{KEY_PREFIX}{name}");
            let Some(entry) = value else {
                return Err(AttrError::MissingValue { key: stored });
            };
            merged.0.insert(stored, entry.to_document());
        }
        Ok(merged)
    }

    /// Store `value` under `key`, returning any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Document) -> Option<Document> {
        self.0.insert(key.into(), value)
    }

    /// The value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<NodeRef<'_>> {
        self.0.get(key).map(Document::root)
    }

    /// Whether `key` is present with any value other than `nil` or `false`.
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|value| value.kind() != NodeKind::Nil && value.as_bool() != Some(false))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A required string or symbol value.
    ///
    /// # Errors
    ///
    /// [`AttrError::Missing`] when absent, [`AttrError::WrongType`] otherwise.
    pub fn string(&self, key: &str) -> Result<&str, AttrError> {
        self.optional_string(key)?.ok_or_else(|| AttrError::Missing {
            key: key.to_owned(),
        })
    }

    /// An optional string or symbol value.
    ///
    /// # Errors
    ///
    /// [`AttrError::WrongType`] when present with another kind.
    pub fn optional_string(&self, key: &str) -> Result<Option<&str>, AttrError> {
        self.get(key)
            .map(|value| {
                value.as_name().ok_or_else(|| AttrError::WrongType {
                    key: key.to_owned(),
                    expected: "a string",
                    found: value.kind(),
                })
            })
            .transpose()
    }

    /// An optional path value.
    ///
    /// # Errors
    ///
    /// [`AttrError::WrongType`] when present with a non-string kind.
    pub fn path(&self, key: &str) -> Result<Option<Utf8PathBuf>, AttrError> {
        Ok(self.optional_string(key)?.map(Utf8PathBuf::from))
    }

    /// A list of strings; a single string counts as a list of one and an
    /// absent key as an empty list.
    ///
    /// # Errors
    ///
    /// [`AttrError::WrongType`] when the value, or any element of it, is not
    /// a string or symbol.
    pub fn strings(&self, key: &str) -> Result<Vec<&str>, AttrError> {
        let Some(value) = self.get(key) else {
            return Ok(Vec::new());
        };
        let wrong = |found| AttrError::WrongType {
            key: key.to_owned(),
            expected: "a string or a vector of strings",
            found,
        };
        match value.kind() {
            NodeKind::String | NodeKind::Symbol => Ok(value.as_name().into_iter().collect()),
            NodeKind::Vector | NodeKind::List => value
                .children()
                .map(|item| item.as_name().ok_or_else(|| wrong(item.kind())))
                .collect(),
            other => Err(wrong(other)),
        }
    }

    /// Like [`Attributes::strings`], but absence or emptiness is an error.
    ///
    /// # Errors
    ///
    /// [`AttrError::Missing`] when absent or empty, [`AttrError::WrongType`]
    /// for non-string content.
    pub fn required_strings(&self, key: &str) -> Result<Vec<&str>, AttrError> {
        let values = self.strings(key)?;
        if values.is_empty() {
            return Err(AttrError::Missing {
                key: key.to_owned(),
            });
        }
        Ok(values)
    }

    /// An optional non-negative integer read as a number of seconds.
    ///
    /// # Errors
    ///
    /// [`AttrError::WrongType`] when present and not a non-negative integer.
    pub fn seconds(&self, key: &str) -> Result<Option<Duration>, AttrError> {
        self.get(key)
            .map(|value| {
                value
                    .as_int()
                    .and_then(|secs| u64::try_from(secs).ok())
                    .map(Duration::from_secs)
                    .ok_or_else(|| AttrError::WrongType {
                        key: key.to_owned(),
                        expected: "a non-negative integer",
                        found: value.kind(),
                    })
            })
            .transpose()
    }
}
