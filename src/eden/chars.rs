//! Constant character tables for the reader and printer.

/// Reader classification of a single input character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    /// Accumulates into a bare token.
    Token,
    /// Collection delimiters and the string quote.
    Delimiter,
    /// Separates tokens; includes the comma.
    Whitespace,
    /// Comment start and the single-character prefixes.
    Control,
    /// Never valid outside a string.
    Invalid,
}

/// Classify `c` the way the reader's state machine consumes it.
pub(crate) const fn classify(c: char) -> CharClass {
    match c {
        ' ' | '\t' | '\n' | '\r' | ',' => CharClass::Whitespace,
        '"' | '(' | ')' | '[' | ']' | '{' | '}' => CharClass::Delimiter,
        '#' | '&' | '\'' | ';' | '^' | '`' | '~' => CharClass::Control,
        '!'..='~' => CharClass::Token,
        c if c > '\u{a0}' && c != '\u{ad}' => CharClass::Token,
        _ => CharClass::Invalid,
    }
}

/// Named character literals, written after a backslash.
pub(crate) const CHAR_NAMES: [(&str, char); 6] = [
    ("newline", '\n'),
    ("space", ' '),
    ("tab", '\t'),
    ("formfeed", '\u{c}'),
    ("backspace", '\u{8}'),
    ("return", '\r'),
];

/// Character named by `name`, if any.
pub(crate) fn char_named(name: &str) -> Option<char> {
    CHAR_NAMES
        .iter()
        .find_map(|(candidate, c)| (*candidate == name).then_some(*c))
}

/// Name of `c` in [`CHAR_NAMES`], if it has one.
pub(crate) fn name_of(c: char) -> Option<&'static str> {
    CHAR_NAMES
        .iter()
        .find_map(|(name, candidate)| (*candidate == c).then_some(*name))
}

/// Translate the character following a backslash inside a string.
pub(crate) const fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'f' => '\u{c}',
        other => other,
    }
}
