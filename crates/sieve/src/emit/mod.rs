//! Backend emitters.
//!
//! | Emitter             | Scheme   | Output            |
//! |---------------------|----------|-------------------|
//! | [`MapEmitter`]      | column   | [`MapQuery`]      |
//! | [`DocumentEmitter`] | document | [`DocumentQuery`] |
//! | [`SearchEmitter`]   | json     | [`SearchQuery`]   |
//! | [`TripleEmitter`]   | document | [`TripleQuery`]   |

mod document;
mod map;
mod search;
mod triple;

pub use document::{DocumentEmitter, DocumentQuery};
pub use map::{Condition, MapEmitter, MapQuery, Page};
pub use search::{SearchEmitter, SearchQuery};
pub use triple::{Triple, TripleEmitter, TripleOp, TripleQuery};

use crate::op::Op;

/// Escapes a literal for use in a regular expression and anchors it by mode.
pub(crate) fn regex_pattern(mode: Op, text: &str) -> String {
    let escaped = regex::escape(text);
    match mode {
        Op::Prefix => format!("^{escaped}"),
        Op::Suffix => format!("{escaped}$"),
        Op::Eq => format!("^{escaped}$"),
        _ => escaped,
    }
}
