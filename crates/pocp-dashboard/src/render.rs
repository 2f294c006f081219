//! Console rendering of the mirrored views

use pocp_sync::{ActionOutcome, RewardRow, SessionEvent, SubmitOutcome};
use pocp_timer::TimerFrame;
use pocp_types::LeaderboardEntry;
use tokio::sync::broadcast::{self, error::RecvError};

pub fn roster(miners: &[String]) -> String {
    if miners.is_empty() {
        return "No miners registered.".to_string();
    }
    let mut out = format!("Miners ({}):", miners.len());
    for miner in miners {
        out.push_str(&format!("\n  {}", miner));
    }
    out
}

pub fn leaderboard(entries: &[LeaderboardEntry]) -> String {
    let mut out = format!("{:<44} {:>10} {:>10}", "Miner", "Time", "CP");
    for entry in entries {
        out.push_str(&format!(
            "\n{:<44} {:>10.3} {:>10.3}",
            entry.miner, entry.time, entry.cp
        ));
    }
    out
}

pub fn rewards(rows: &[RewardRow]) -> String {
    let mut out = format!("{:<44} {:>10}", "Address", "Reward");
    for row in rows {
        out.push_str(&format!("\n{:<44} {:>10}", row.address, row.reward));
    }
    out
}

pub fn timer(frame: &TimerFrame) -> String {
    match frame.severity {
        Some(severity) => format!(
            "Timer {} [{:>3.0}% {}]",
            frame.label, frame.progress_percent, severity
        ),
        None => "Timer idle".to_string(),
    }
}

pub fn outcome(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Registered(address) => format!("Registered {}", address),
        ActionOutcome::RoundStarted(true) => "Round started".to_string(),
        ActionOutcome::RoundStarted(false) => "Round already running".to_string(),
        ActionOutcome::Submitted(SubmitOutcome::Accepted { submitted, total }) => {
            format!("Submission accepted ({}/{})", submitted, total)
        }
        ActionOutcome::Submitted(SubmitOutcome::RoundComplete) => {
            "Submission accepted, round complete".to_string()
        }
        ActionOutcome::Submitted(SubmitOutcome::Stale) => {
            "Submission arrived after the round changed; ignored locally".to_string()
        }
        ActionOutcome::ValidatorSelected(validator) => format!("Validator: {}", validator),
        ActionOutcome::RoundReset(round) => format!("Round reset ({})", round),
        ActionOutcome::Refreshed => "Views refreshed".to_string(),
        ActionOutcome::Addresses(addresses) => {
            let mut out = "Available addresses:".to_string();
            for address in addresses {
                out.push_str(&format!("\n  {}", address));
            }
            out
        }
    }
}

/// Feed notices for session events to `sink` until the session goes away.
///
/// A lagging receiver skips the dropped events and keeps going.
pub async fn forward_notices(
    mut events: broadcast::Receiver<SessionEvent>,
    mut sink: impl FnMut(String),
) {
    loop {
        match events.recv().await {
            Ok(session_event) => {
                if let Some(notice) = event(&session_event) {
                    sink(notice);
                }
            }
            Err(RecvError::Lagged(n)) => {
                tracing::warn!("Event printer lagged {} events", n);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Notice for events the user should see, if any
pub fn event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::RoundComplete { submitted, .. } => Some(format!(
            "All {} miners have submitted. Timer stopped.",
            submitted
        )),
        SessionEvent::RefreshFailed { view, reason } => {
            Some(format!("Could not refresh {}: {}", view, reason))
        }
        _ => None,
    }
}
