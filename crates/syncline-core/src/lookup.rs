//! Single-object lookup outcomes.
//!
//! Both the canonical store and endpoints answer "find exactly one" queries.
//! Absence is a normal answer, not an error; ambiguity is reported with the
//! match count so callers can fail loudly.

use serde::Serialize;

/// Outcome of a lookup that expects at most one match.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    /// Exactly one object matched.
    Found(T),
    /// Nothing matched.
    NotFound,
    /// The filter referenced an attribute the backend cannot resolve.
    Unresolvable,
    /// More than one object matched.
    Multiple {
        /// Number of matches observed.
        count: usize,
    },
}

impl<T> Lookup<T> {
    /// Build a lookup outcome from an iterator of candidate matches.
    pub fn from_matches<I: IntoIterator<Item = T>>(matches: I) -> Self {
        let mut iter = matches.into_iter();
        match (iter.next(), iter.next()) {
            (None, _) => Lookup::NotFound,
            (Some(only), None) => Lookup::Found(only),
            (Some(_), Some(_)) => Lookup::Multiple {
                count: 2 + iter.count(),
            },
        }
    }

    /// Whether exactly one object matched.
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Map the found value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Unresolvable => Lookup::Unresolvable,
            Lookup::Multiple { count } => Lookup::Multiple { count },
        }
    }
}
