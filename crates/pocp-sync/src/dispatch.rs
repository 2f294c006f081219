//! Action dispatch - maps UI action names onto session operations

use crate::backend::Backend;
use crate::error::{ActionParseError, SyncError};
use crate::session::{DashboardSession, SubmitOutcome};
use pocp_types::RoundId;
use std::str::FromStr;

/// A user-triggered dashboard action
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Register the given address as a miner
    Register(String),
    /// Start the round timer
    Start,
    /// Submit a time; `None` means "now", per the round timer
    Submit { address: String, time: Option<f64> },
    SelectValidator,
    Reset,
    /// Reload roster, leaderboard and rewards
    Refresh,
    /// Reload the registration picker addresses
    Addresses,
}

impl Action {
    /// Action names accepted by [`Action::from_str`]
    pub const NAMES: &'static [&'static str] = &[
        "register", "start", "submit", "validator", "reset", "refresh", "addresses",
    ];
}

impl FromStr for Action {
    type Err = ActionParseError;

    /// Parse `name [args...]`, e.g. `submit 0xabc 1.25`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(ActionParseError::Empty)?;

        match name.to_ascii_lowercase().as_str() {
            "register" => {
                let address = parts.next().ok_or(ActionParseError::MissingArgument {
                    action: "register",
                    argument: "address",
                })?;
                Ok(Action::Register(address.to_string()))
            }
            "start" => Ok(Action::Start),
            "submit" => {
                let address = parts.next().ok_or(ActionParseError::MissingArgument {
                    action: "submit",
                    argument: "address",
                })?;
                let time = parts
                    .next()
                    .map(|raw| match raw.parse::<f64>() {
                        Ok(t) if t.is_finite() && t >= 0.0 => Ok(t),
                        _ => Err(ActionParseError::InvalidTime(raw.to_string())),
                    })
                    .transpose()?;
                Ok(Action::Submit {
                    address: address.to_string(),
                    time,
                })
            }
            "validator" => Ok(Action::SelectValidator),
            "reset" => Ok(Action::Reset),
            "refresh" => Ok(Action::Refresh),
            "addresses" => Ok(Action::Addresses),
            other => Err(ActionParseError::UnknownAction(other.to_string())),
        }
    }
}

/// What an action produced, for the host to render
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Registered(String),
    /// `false` if a round was already running
    RoundStarted(bool),
    Submitted(SubmitOutcome),
    ValidatorSelected(String),
    RoundReset(RoundId),
    Refreshed,
    Addresses(Vec<String>),
}

/// Run one action against the session
pub async fn dispatch<B: Backend>(
    session: &DashboardSession<B>,
    action: Action,
) -> Result<ActionOutcome, SyncError> {
    tracing::debug!("Dispatching {:?}", action);
    match action {
        Action::Register(address) => {
            session.register(&address).await?;
            Ok(ActionOutcome::Registered(address))
        }

        Action::Start => Ok(ActionOutcome::RoundStarted(session.start_round())),

        Action::Submit { address, time } => {
            let outcome = match time {
                Some(time) => session.submit(&address, time).await?,
                None => session.submit_now(&address).await?,
            };
            Ok(ActionOutcome::Submitted(outcome))
        }

        Action::SelectValidator => Ok(ActionOutcome::ValidatorSelected(
            session.select_validator().await?,
        )),

        Action::Reset => Ok(ActionOutcome::RoundReset(session.reset_round().await?)),

        Action::Refresh => {
            session.refresh().await;
            Ok(ActionOutcome::Refreshed)
        }

        Action::Addresses => {
            session.load_addresses().await?;
            Ok(ActionOutcome::Addresses(session.addresses()))
        }
    }
}
