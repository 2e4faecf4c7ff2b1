//! The notation engine: a reader and printer for a small EDN-like format.
//!
//! Both the defaults file and the build specification are written in this
//! notation. [`read`] produces a [`Document`], an arena of typed nodes whose
//! root vector holds the top-level forms; [`pprint`] renders a document back
//! into canonical text.
//!
//! Supported forms: `nil`, `true`, `false`, character literals (`\a`,
//! `\newline`, `\o142`, `\u0041`), integers, floats, strings, symbols,
//! keywords, lists, vectors, maps and `#{}` sets. Line comments start with
//! `;` and commas count as whitespace. The `^`, `` ` ``, `'` and `~` prefixes
//! are accepted but have no effect, as does `#` before anything other than
//! `{`.

mod chars;
mod error;
mod node;
mod printer;
mod reader;

pub use error::{ReadError, ReadErrorKind};
pub use node::{Children, Document, Node, NodeId, NodeKind, NodeRef, Pairs};
pub use printer::{pprint, print};
pub use reader::{ANONYMOUS_SOURCE, read, read_named};
