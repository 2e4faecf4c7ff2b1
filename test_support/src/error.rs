//! Error formatting for assertions on whole cause chains.

use std::error::Error;

/// Render `err` followed by each of its sources, separated by `": "`.
pub fn display_error_chain(err: &(dyn Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut cause = err.source();
    while let Some(inner) = cause {
        parts.push(inner.to_string());
        cause = inner.source();
    }
    parts.join(": ")
}
