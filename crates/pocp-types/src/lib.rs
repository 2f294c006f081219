//! Shared types for the PoCP dashboard
//!
//! Request and response bodies for every backend endpoint the dashboard
//! consumes, plus the round stamp used to discard stale completions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend endpoint paths, relative so they keep any base URL path prefix
pub mod endpoints {
    pub const MINERS: &str = "miners";
    pub const LEADERBOARD: &str = "leaderboard";
    pub const REWARDS: &str = "get_reward";
    pub const REGISTER: &str = "register";
    pub const SUBMIT_TIME: &str = "submit_time";
    pub const SELECT_VALIDATOR: &str = "select_validator";
    pub const RESET_ROUND: &str = "reset_round";
    pub const ADDRESSES: &str = "hardhat_addresses";
}

/// Lower-cased form of an address, used for case-insensitive lookups
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Registered miner roster (`GET /miners`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterResponse {
    #[serde(default)]
    pub miners: Vec<String>,
}

/// A single leaderboard row, computed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub miner: String,
    /// Submitted time in seconds
    pub time: f64,
    /// Adjusted computational power score
    pub cp: f64,
}

/// Leaderboard snapshot (`GET /leaderboard`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(default)]
    pub entries: Vec<LeaderboardEntry>,
}

/// Reward balance for one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub address: String,
    pub reward: f64,
}

/// Reward snapshot (`GET /get_reward`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardsResponse {
    #[serde(default)]
    pub rewards: Vec<RewardEntry>,
}

/// Registration body (`POST /register`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub address: String,
}

/// Time submission body (`POST /submit_time`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTimeRequest {
    pub address: String,
    /// Elapsed seconds since round start
    pub time: f64,
}

/// Validator selection result (`GET /select_validator`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorResponse {
    pub validator: String,
}

/// Addresses available for registration (`GET /hardhat_addresses`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressesResponse {
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// Generic status body returned by state-changing endpoints.
///
/// Success carries `status`, failure carries `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Monotonic identifier stamped on each local round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundId(pub u64);

impl RoundId {
    /// The identifier following this one
    pub fn next(self) -> Self {
        RoundId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
