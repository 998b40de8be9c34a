//! Per-channel session state machine.
//!
//! The tracker decides, from each poll result, whether a session opens,
//! continues, rolls over to a new livestream, or closes. The decision is a
//! pure function of the current state and the observation; the worker
//! executes the resulting transition against storage.

/// Session tracking state for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    /// No open session.
    Closed,
    /// A session is open for the given livestream.
    Open {
        session_id: String,
        livestream_id: String,
    },
}

/// The action a poll result demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do: closed and still offline, or the same livestream
    /// continues.
    Stay,
    /// Open a new session.
    Open,
    /// The observed livestream id differs from the tracked one: close the
    /// current session and open a new one in the same poll window.
    Reopen,
    /// Close the current session.
    Close,
}

impl TrackerState {
    /// Decide the transition for one poll result.
    ///
    /// A live poll without a livestream id behaves as offline for session
    /// purposes: the sample cannot be attributed to any session.
    pub fn transition(&self, is_live: bool, livestream_id: Option<&str>) -> Transition {
        match (self, is_live, livestream_id) {
            (TrackerState::Closed, true, Some(_)) => Transition::Open,
            (TrackerState::Open { livestream_id: tracked, .. }, true, Some(observed)) => {
                if tracked == observed {
                    Transition::Stay
                } else {
                    Transition::Reopen
                }
            }
            (TrackerState::Open { .. }, _, _) => Transition::Close,
            (TrackerState::Closed, _, _) => Transition::Stay,
        }
    }

    /// The open session id, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            TrackerState::Open { session_id, .. } => Some(session_id),
            TrackerState::Closed => None,
        }
    }
}
