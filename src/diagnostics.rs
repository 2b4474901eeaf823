//! Non-fatal build warnings.
//!
//! Warnings are collected across every stage and returned with the build
//! outcome. They never stop a build; fatal conditions are the error enums of
//! the individual stages.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A `{{ … }}` or `{% … %}` directive the renderer does not know.
    /// The original text is kept in the output.
    UnresolvedDirective {
        document: String,
        line: usize,
        directive: String,
    },
    /// Two documents in one collection share date and title. They are
    /// ordered by identity instead.
    DuplicateOrderingKey {
        collection: String,
        first: String,
        second: String,
    },
    /// A near-duplicate was dropped by the `first` duplicate policy.
    DuplicateDocument { kept: String, dropped: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedDirective {
                document,
                line,
                directive,
            } => write!(f, "unresolved directive {directive} in {document}:{line}"),
            Warning::DuplicateOrderingKey {
                collection,
                first,
                second,
            } => write!(
                f,
                "duplicate ordering key in collection '{collection}': {first} and {second} (ordered by path)"
            ),
            Warning::DuplicateDocument { kept, dropped } => {
                write!(f, "duplicate document {dropped} dropped in favour of {kept}")
            }
        }
    }
}
