//! Per-commodity fallback state machine
//!
//! `Pending -> Trying(step) -> Accepted | Exhausted`. The override, when
//! present, is the step before the first source. The state is a plain value
//! threaded through the chain so independent commodities share nothing.

use super::Provenance;

/// One position in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Override,
    /// Index into the ordered source list
    Source(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChainState {
    Pending,
    Trying(Step),
    Accepted { value: f64, provenance: Provenance },
    Exhausted,
}

impl ChainState {
    /// Leave `Pending` for the first step
    pub fn begin(self, has_override: bool, sources: usize) -> Self {
        match self {
            ChainState::Pending if has_override => ChainState::Trying(Step::Override),
            ChainState::Pending => Self::source_or_exhausted(0, sources),
            other => other,
        }
    }

    /// The current step produced an acceptable value
    pub fn accept(self, value: f64, provenance: Provenance) -> Self {
        match self {
            ChainState::Trying(_) => ChainState::Accepted { value, provenance },
            other => other,
        }
    }

    /// The current step produced nothing usable
    pub fn reject(self, sources: usize) -> Self {
        match self {
            ChainState::Trying(Step::Override) => Self::source_or_exhausted(0, sources),
            ChainState::Trying(Step::Source(i)) => Self::source_or_exhausted(i + 1, sources),
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChainState::Accepted { .. } | ChainState::Exhausted)
    }

    fn source_or_exhausted(index: usize, sources: usize) -> Self {
        if index < sources {
            ChainState::Trying(Step::Source(index))
        } else {
            ChainState::Exhausted
        }
    }
}
