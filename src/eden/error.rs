//! Reader diagnostics.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use super::NodeKind;

/// What went wrong while reading notation text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadErrorKind {
    /// A closing delimiter did not match the innermost open collection.
    #[error("mismatched delimiter: `{found}` cannot close a {open}")]
    MismatchedClose {
        /// Kind of the collection that is still open.
        open: NodeKind,
        /// The closing delimiter that was read.
        found: char,
    },
    /// A closing delimiter appeared with no collection open.
    #[error("unmatched closing delimiter `{0}`")]
    UnmatchedClose(char),
    /// Input ended while a collection was still open.
    #[error("unclosed {0} at end of input")]
    UnclosedCollection(NodeKind),
    /// Input ended inside a string literal.
    #[error("unterminated string literal")]
    UnterminatedString,
    /// A backslash token that names no character.
    #[error("unknown character literal `{0}`")]
    UnknownCharacter(String),
    /// A character that cannot appear outside a string.
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),
}

/// A read failure pointing at the offending span of the input.
#[derive(Debug, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(aa::eden::read))]
pub struct ReadError {
    kind: ReadErrorKind,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
}

impl ReadError {
    pub(crate) fn new(kind: ReadErrorKind, name: &str, source: &str, span: (usize, usize)) -> Self {
        Self {
            kind,
            src: NamedSource::new(name, source.to_owned()),
            span: span.into(),
        }
    }

    /// The failure category.
    #[must_use]
    pub const fn kind(&self) -> &ReadErrorKind {
        &self.kind
    }

    /// Byte offset of the offending input.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}
