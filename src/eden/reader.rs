//! Streaming reader turning notation text into a [`Document`].
//!
//! The reader is a character-at-a-time state machine. Whatever the input
//! holds is wrapped in an implicit top-level vector, so a text unit may carry
//! any number of forms, including none.

use tracing::trace;

use super::chars::{self, CharClass};
use super::error::{ReadError, ReadErrorKind};
use super::node::{Document, Node, NodeId, NodeKind};

/// Name used in diagnostics when the caller supplies none.
pub const ANONYMOUS_SOURCE: &str = "<input>";

/// Read `text` into a document whose root vector holds the top-level forms.
///
/// # Errors
///
/// Returns a [`ReadError`] for mismatched or unclosed delimiters, unterminated
/// strings, unknown character literals and characters that may not appear
/// outside a string.
///
/// # Examples
///
/// ```
/// use aa::eden::{read, NodeKind};
///
/// let doc = read("(a (b))").expect("valid notation");
/// let list = doc.forms().next().expect("one form");
/// assert_eq!(list.kind(), NodeKind::List);
/// assert_eq!(list.len(), 2);
/// ```
pub fn read(text: &str) -> Result<Document, ReadError> {
    read_named(ANONYMOUS_SOURCE, text)
}

/// Read `text`, labelling diagnostics with `name`.
///
/// # Errors
///
/// See [`read`].
pub fn read_named(name: &str, text: &str) -> Result<Document, ReadError> {
    let mut reader = Reader::new();
    for (offset, c) in text.char_indices() {
        reader
            .eat(offset, c)
            .map_err(|(kind, span)| ReadError::new(kind, name, text, span))?;
    }
    reader
        .finish(text.len())
        .map_err(|(kind, span)| ReadError::new(kind, name, text, span))
}

type Failure = (ReadErrorKind, (usize, usize));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    InString,
    InEscapedString,
    InComment,
    InToken,
}

#[derive(Debug, Clone, Copy)]
struct Open {
    id: NodeId,
    kind: NodeKind,
    offset: usize,
}

struct Reader {
    state: State,
    doc: Document,
    stack: Vec<Open>,
    token: String,
    token_start: usize,
    hash_pending: bool,
}

impl Reader {
    fn new() -> Self {
        let doc = Document::default();
        let root = Open {
            id: doc.root_id(),
            kind: NodeKind::Vector,
            offset: 0,
        };
        Self {
            state: State::Normal,
            doc,
            stack: vec![root],
            token: String::new(),
            token_start: 0,
            hash_pending: false,
        }
    }

    fn eat(&mut self, offset: usize, c: char) -> Result<(), Failure> {
        match self.state {
            State::InString => {
                match c {
                    '\\' => self.state = State::InEscapedString,
                    '"' => {
                        self.state = State::Normal;
                        let text = std::mem::take(&mut self.token);
                        self.attach(Node::String(text));
                    }
                    other => self.token.push(other),
                }
                return Ok(());
            }
            State::InEscapedString => {
                self.state = State::InString;
                self.token.push(chars::unescape(c));
                return Ok(());
            }
            State::InComment => {
                if c == '\n' {
                    self.state = State::Normal;
                }
                return Ok(());
            }
            State::Normal | State::InToken => {}
        }

        let class = chars::classify(c);
        if std::mem::take(&mut self.hash_pending) && c == '{' {
            return self.open(NodeKind::Set, offset);
        }

        if class == CharClass::Token {
            if self.state == State::Normal {
                self.state = State::InToken;
                self.token.clear();
                self.token_start = offset;
            }
            self.token.push(c);
            return Ok(());
        }

        if self.state == State::InToken {
            self.record_token()?;
            self.state = State::Normal;
        }

        match class {
            CharClass::Whitespace | CharClass::Token => Ok(()),
            CharClass::Delimiter => self.eat_delimiter(offset, c),
            CharClass::Control => self.eat_control(offset, c),
            CharClass::Invalid => Err(unexpected(offset, c)),
        }
    }

    fn eat_delimiter(&mut self, offset: usize, c: char) -> Result<(), Failure> {
        match c {
            '"' => {
                self.state = State::InString;
                self.token.clear();
                self.token_start = offset;
                Ok(())
            }
            '(' => self.open(NodeKind::List, offset),
            '[' => self.open(NodeKind::Vector, offset),
            '{' => self.open(NodeKind::Map, offset),
            _ => self.close(offset, c),
        }
    }

    fn eat_control(&mut self, offset: usize, c: char) -> Result<(), Failure> {
        match c {
            ';' => {
                self.state = State::InComment;
                Ok(())
            }
            '#' => {
                self.hash_pending = true;
                Ok(())
            }
            // Metadata, quote, syntax-quote and unquote prefixes are accepted
            // and have no effect on the form that follows.
            '^' | '`' | '\'' | '~' => {
                trace!(prefix = %c, offset, "ignoring reader prefix");
                Ok(())
            }
            _ => Err(unexpected(offset, c)),
        }
    }

    fn open(&mut self, kind: NodeKind, offset: usize) -> Result<(), Failure> {
        let parent = self.top().id;
        let node = Node::empty(kind).unwrap_or(Node::Nil);
        let id = self
            .doc
            .push(parent, node)
            .ok_or_else(|| unexpected(offset, '('))?;
        self.stack.push(Open { id, kind, offset });
        Ok(())
    }

    fn close(&mut self, offset: usize, c: char) -> Result<(), Failure> {
        if self.stack.len() <= 1 {
            return Err((ReadErrorKind::UnmatchedClose(c), (offset, 1)));
        }
        let open = self.top();
        let matches = match c {
            ')' => open.kind == NodeKind::List,
            ']' => open.kind == NodeKind::Vector,
            _ => matches!(open.kind, NodeKind::Map | NodeKind::Set),
        };
        if !matches {
            return Err((
                ReadErrorKind::MismatchedClose {
                    open: open.kind,
                    found: c,
                },
                (offset, 1),
            ));
        }
        self.stack.pop();
        Ok(())
    }

    fn top(&self) -> Open {
        self.stack.last().copied().unwrap_or(Open {
            id: self.doc.root_id(),
            kind: NodeKind::Vector,
            offset: 0,
        })
    }

    fn attach(&mut self, node: Node) {
        let parent = self.top().id;
        // The stack only ever holds collection ids, so this cannot fail.
        let _attached = self.doc.push(parent, node);
    }

    fn record_token(&mut self) -> Result<(), Failure> {
        let token = std::mem::take(&mut self.token);
        let span = (self.token_start, token.len());
        let node = atom_from_token(&token).map_err(|kind| (kind, span))?;
        self.attach(node);
        Ok(())
    }

    fn finish(mut self, end: usize) -> Result<Document, Failure> {
        match self.state {
            State::InString | State::InEscapedString => {
                return Err((
                    ReadErrorKind::UnterminatedString,
                    (self.token_start, end.saturating_sub(self.token_start)),
                ));
            }
            State::InToken => self.record_token()?,
            State::Normal | State::InComment => {}
        }
        if self.stack.len() > 1 {
            let open = self.top();
            return Err((ReadErrorKind::UnclosedCollection(open.kind), (open.offset, 1)));
        }
        Ok(self.doc)
    }
}

fn unexpected(offset: usize, c: char) -> Failure {
    (
        ReadErrorKind::UnexpectedCharacter(c),
        (offset, c.len_utf8()),
    )
}

/// Convert a completed bare token into an atom.
fn atom_from_token(token: &str) -> Result<Node, ReadErrorKind> {
    if token.starts_with('\\') {
        return char_from_token(token)
            .map(Node::Char)
            .ok_or_else(|| ReadErrorKind::UnknownCharacter(token.to_owned()));
    }
    if let Some(keyword) = token.strip_prefix(':') {
        return Ok(Node::Keyword(keyword.to_owned()));
    }
    if looks_numeric(token)
        && let Some(number) = parse_number(token)
    {
        return Ok(number);
    }
    Ok(match token {
        "nil" => Node::Nil,
        "true" => Node::Bool(true),
        "false" => Node::Bool(false),
        symbol => Node::Symbol(symbol.to_owned()),
    })
}

fn looks_numeric(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('+' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn parse_number(token: &str) -> Option<Node> {
    if token.contains(['.', 'e', 'E']) {
        token.parse::<f64>().ok().map(Node::Float)
    } else {
        token.parse::<i64>().ok().map(Node::Int)
    }
}

/// Resolve a `\`-prefixed token to the character it names.
fn char_from_token(token: &str) -> Option<char> {
    let name = token.strip_prefix('\\')?;
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (None, _) => return None,
        (Some(c), None) => return Some(c),
        _ => {}
    }
    if let Some(digits) = name.strip_prefix('o')
        && let Some(c) = octal_char(digits)
    {
        return Some(c);
    }
    if let Some(digits) = name.strip_prefix('u')
        && let Some(c) = unicode_char(digits)
    {
        return Some(c);
    }
    chars::char_named(name)
}

/// `NNN` with the first digit in `0-3` and the rest in `0-7`.
fn octal_char(digits: &str) -> Option<char> {
    let bytes = digits.as_bytes();
    let [first, second, third] = bytes else {
        return None;
    };
    let in_range = (b'0'..=b'3').contains(first)
        && (b'0'..=b'7').contains(second)
        && (b'0'..=b'7').contains(third);
    if !in_range {
        return None;
    }
    let value = ((first - b'0') << 6) | ((second - b'0') << 3) | (third - b'0');
    Some(char::from(value))
}

/// Four to six hexadecimal digits naming a code point.
fn unicode_char(digits: &str) -> Option<char> {
    if !(4..=6).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
}
