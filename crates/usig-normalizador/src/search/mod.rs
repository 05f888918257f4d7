//! Stateless pieces of the search pipeline.
//!
//! [`normalize`] decides whether raw input is worth a request, [`classify`] turns
//! whatever came back into a [`SearchOutcome`].

mod classify;
mod normalize;

pub use classify::{MALFORMED_RESPONSE, UNEXPECTED_RESPONSE, classify, classify_location};
pub use normalize::normalize;

use crate::address::Address;

/// Classified result of the latest completed (or short-circuited) search.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchOutcome {
    /// No query yet, or the query was cleared.
    #[default]
    Empty,
    /// Matches in service order, at most `max_results` of them.
    Results(Vec<Address>),
    /// The service explicitly reported that no such street exists.
    NotFound,
    /// Transport failure or an answer that could not be understood.
    Error(String),
}

impl SearchOutcome {
    /// Addresses carried by this outcome; empty for every variant but `Results`.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        match self {
            Self::Results(addresses) => addresses,
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
