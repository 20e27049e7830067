//! # Domain Value Objects
//!
//! Immutable value types for endorsed cross-chain queries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of query replayed by endorsers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
    /// Contract pre-execution on the remote chain.
    CrossQuery,
    /// Transaction lookup by id on the remote chain.
    TxQuery,
}

impl QueryKind {
    /// Request name carried in the endorser envelope.
    pub fn request_name(&self) -> &'static str {
        match self {
            QueryKind::CrossQuery => "CrossQueryPreExec",
            QueryKind::TxQuery => "TxQuery",
        }
    }

    /// Parse an envelope request name.
    pub fn from_request_name(name: &str) -> Option<Self> {
        match name {
            "CrossQueryPreExec" => Some(QueryKind::CrossQuery),
            "TxQuery" => Some(QueryKind::TxQuery),
            _ => None,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.request_name())
    }
}

/// Query lifecycle.
///
/// `Validating -> Collecting -> Verifying -> Done`, or `Failed` from any
/// non-terminal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryState {
    /// Checking the endorsement policy.
    #[default]
    Validating,
    /// Fan-out to endorsers in flight.
    Collecting,
    /// Checking request echo, identities, quorum and signatures.
    Verifying,
    /// Verified result returned.
    Done,
    /// Terminated with an error.
    Failed,
}

impl QueryState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: QueryState) -> bool {
        match (self, next) {
            (Self::Validating, Self::Collecting) => true,
            (Self::Collecting, Self::Verifying) => true,
            (Self::Verifying, Self::Done) => true,
            (current, Self::Failed) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}
