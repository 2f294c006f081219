//! Session notifications for the host UI

use chrono::{DateTime, Utc};
use pocp_types::RoundId;
use std::fmt;

/// Mirrored view refreshed from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Roster,
    Leaderboard,
    Rewards,
    Addresses,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Roster => "roster",
            View::Leaderboard => "leaderboard",
            View::Rewards => "rewards",
            View::Addresses => "addresses",
        };
        f.write_str(name)
    }
}

/// Something the host should react to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RoundStarted {
        round: RoundId,
        started_at: DateTime<Utc>,
    },
    SubmissionAccepted {
        round: RoundId,
        address: String,
        time: f64,
    },
    /// Every known participant has submitted; fires once per round
    RoundComplete { round: RoundId, submitted: usize },
    ValidatorSelected { validator: String },
    RoundReset { round: RoundId },
    /// A read-only refresh failed and the view was degraded
    RefreshFailed { view: View, reason: String },
}
