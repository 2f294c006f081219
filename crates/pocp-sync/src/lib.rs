//! PoCP Sync - client-side mirror of the dashboard backend
//!
//! Architecture:
//! - `Backend` is the request/response seam to the authoritative server
//! - `HttpBackend` speaks the JSON endpoints over reqwest
//! - `DashboardSession` holds the advisory mirrors (roster, leaderboard,
//!   rewards), the per-round Submission Set and the Round Timer
//! - `dispatch` maps UI action names onto session operations

pub mod backend;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod session;

pub use backend::{Backend, HttpBackend};
pub use dispatch::{dispatch, Action, ActionOutcome};
pub use error::{ActionParseError, BackendError, SyncError};
pub use events::{SessionEvent, View};
pub use session::{build_reward_table, DashboardSession, RewardRow, SubmitOutcome};

/// Default request timeout in milliseconds
pub const REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Capacity of the session event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
