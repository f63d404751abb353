/// Traversal state definitions for the level-by-level crawl
///
/// The crawl moves through depth levels. Each level starts `Pending` with a
/// frontier, runs one or more `Fetching` batches, and then either
/// `Advancing` to a deeper level or finishing as `Done`.
use crate::AuditError;
use std::fmt;

/// Why a traversal finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoneReason {
    /// No URLs left to fetch at any deeper level
    FrontierExhausted,

    /// The page budget was used up
    BudgetExhausted,

    /// The deepest allowed level has been processed
    DepthCeiling,
}

impl DoneReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrontierExhausted => "frontier_exhausted",
            Self::BudgetExhausted => "budget_exhausted",
            Self::DepthCeiling => "depth_ceiling",
        }
    }
}

impl fmt::Display for DoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current position of the traversal controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    /// A level is ready to run with `frontier` URLs queued
    Pending { depth: u32, frontier: usize },

    /// A batch of `in_flight` URLs of this level is being fetched
    Fetching { depth: u32, in_flight: usize },

    /// The level settled; `collected` links queued for the next level
    Advancing { depth: u32, collected: usize },

    /// Terminal
    Done(DoneReason),
}

impl TraversalState {
    /// The initial state for a crawl starting at one seed
    pub fn start() -> Self {
        Self::Pending {
            depth: 0,
            frontier: 1,
        }
    }

    /// Depth of the current level, if the traversal is still running
    pub fn depth(&self) -> Option<u32> {
        match self {
            Self::Pending { depth, .. }
            | Self::Fetching { depth, .. }
            | Self::Advancing { depth, .. } => Some(*depth),
            Self::Done(_) => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending { .. } => "pending",
            Self::Fetching { .. } => "fetching",
            Self::Advancing { .. } => "advancing",
            Self::Done(_) => "done",
        }
    }

    /// Returns true if moving from `self` to `next` is allowed
    ///
    /// - `Pending(d)` -> `Fetching(d)` or `Done`
    /// - `Fetching(d)` -> `Fetching(d)` (next batch), `Advancing(d' > d)` or `Done`
    /// - `Advancing(d)` -> `Pending(d)`
    /// - `Done` is terminal
    pub fn can_transition_to(&self, next: &TraversalState) -> bool {
        use TraversalState::*;

        match (self, next) {
            (Pending { depth: a, .. }, Fetching { depth: b, .. }) => a == b,
            (Pending { .. }, Done(_)) => true,
            (Fetching { depth: a, .. }, Fetching { depth: b, .. }) => a == b,
            (Fetching { depth: a, .. }, Advancing { depth: b, .. }) => b > a,
            (Fetching { .. }, Done(_)) => true,
            (Advancing { depth: a, .. }, Pending { depth: b, .. }) => a == b,
            _ => false,
        }
    }

    /// Moves to `next`, rejecting transitions the controller must never make
    pub fn transition(self, next: TraversalState) -> Result<TraversalState, AuditError> {
        if self.can_transition_to(&next) {
            tracing::trace!("Traversal {} -> {}", self, next);
            Ok(next)
        } else {
            Err(AuditError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { depth, frontier } => {
                write!(f, "pending(depth={}, frontier={})", depth, frontier)
            }
            Self::Fetching { depth, in_flight } => {
                write!(f, "fetching(depth={}, in_flight={})", depth, in_flight)
            }
            Self::Advancing { depth, collected } => {
                write!(f, "advancing(depth={}, collected={})", depth, collected)
            }
            Self::Done(reason) => write!(f, "done({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_state() {
        let state = TraversalState::start();
        assert_eq!(state.depth(), Some(0));
        assert_eq!(state.as_str(), "pending");
        assert!(!state.is_done());
    }

    #[test]
    fn test_full_level_cycle() {
        let state = TraversalState::start()
            .transition(TraversalState::Fetching {
                depth: 0,
                in_flight: 1,
            })
            .unwrap()
            .transition(TraversalState::Advancing {
                depth: 1,
                collected: 12,
            })
            .unwrap()
            .transition(TraversalState::Pending {
                depth: 1,
                frontier: 12,
            })
            .unwrap()
            .transition(TraversalState::Fetching {
                depth: 1,
                in_flight: 10,
            })
            .unwrap()
            .transition(TraversalState::Fetching {
                depth: 1,
                in_flight: 2,
            })
            .unwrap()
            .transition(TraversalState::Done(DoneReason::DepthCeiling))
            .unwrap();

        assert!(state.is_done());
        assert_eq!(state.depth(), None);
        assert_eq!(state.to_string(), "done(depth_ceiling)");
    }

    #[test]
    fn test_pending_can_finish() {
        let pending = TraversalState::Pending {
            depth: 3,
            frontier: 0,
        };
        assert!(pending.can_transition_to(&TraversalState::Done(DoneReason::FrontierExhausted)));
    }

    #[test]
    fn test_invalid_transitions() {
        let pending = TraversalState::start();
        // cannot skip the fetch phase
        assert!(!pending.can_transition_to(&TraversalState::Advancing {
            depth: 1,
            collected: 0
        }));
        // fetching must stay on its level
        assert!(!pending.can_transition_to(&TraversalState::Fetching {
            depth: 1,
            in_flight: 1
        }));

        let fetching = TraversalState::Fetching {
            depth: 2,
            in_flight: 1,
        };
        assert!(!fetching.can_transition_to(&TraversalState::Advancing {
            depth: 2,
            collected: 0
        }));

        let done = TraversalState::Done(DoneReason::BudgetExhausted);
        assert!(!done.can_transition_to(&TraversalState::start()));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = TraversalState::Done(DoneReason::BudgetExhausted)
            .transition(TraversalState::start())
            .unwrap_err();
        match err {
            AuditError::InvalidTransition { from, to } => {
                assert_eq!(from, "done(budget_exhausted)");
                assert_eq!(to, "pending(depth=0, frontier=1)");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_done_reason_strings() {
        assert_eq!(DoneReason::FrontierExhausted.as_str(), "frontier_exhausted");
        assert_eq!(DoneReason::BudgetExhausted.to_string(), "budget_exhausted");
    }
}
