//! Run lifecycle.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Preparing,
    Parsing,
    Downloading,
    Merging,
    Cleaning,
    Done,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }

    /// Forward-only; `Failed` is reachable from every non-terminal phase.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Preparing, Parsing)
            | (Parsing, Downloading)
            | (Downloading, Merging)
            | (Merging, Cleaning)
            | (Cleaning, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Preparing => "preparing",
            Phase::Parsing => "parsing",
            Phase::Downloading => "downloading",
            Phase::Merging => "merging",
            Phase::Cleaning => "cleaning",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Current phase of one run; every change is logged.
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    current: Phase,
}

impl PhaseTracker {
    pub(crate) fn new() -> Self {
        Self {
            current: Phase::Preparing,
        }
    }

    pub(crate) fn current(&self) -> Phase {
        self.current
    }

    pub(crate) fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal transition {} -> {}",
            self.current,
            next
        );
        tracing::debug!(from = %self.current, to = %next, "phase");
        self.current = next;
    }
}
