//! Dashboard session - the host-owned context for one page load
//!
//! Holds the advisory mirrors of backend state and the per-round
//! Submission Set. The backend stays authoritative: the mirrors only gate
//! local UI actions and are rebuilt from scratch on every new session.
//!
//! Locks are never held across an `.await`. Every operation re-reads state
//! after its network call resolves, since a reset may land in between.

use crate::backend::Backend;
use crate::error::{BackendError, SyncError};
use crate::events::{SessionEvent, View};
use crate::EVENT_CHANNEL_CAPACITY;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pocp_timer::RoundTimer;
use pocp_types::{
    normalize_address, LeaderboardEntry, RegisterRequest, RewardEntry, RoundId, SubmitTimeRequest,
};
use std::collections::{HashMap, HashSet};
use tokio::sync::broadcast;

/// Reward table row, one per roster participant
#[derive(Debug, Clone, PartialEq)]
pub struct RewardRow {
    pub address: String,
    pub reward: f64,
}

/// Result of an accepted submit call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Recorded; the round is still open
    Accepted { submitted: usize, total: usize },
    /// Recorded, and this submission completed the round
    RoundComplete,
    /// The backend accepted it, but the round was reset or restarted meanwhile
    Stale,
}

/// Join the roster against reward entries.
///
/// Addresses match case-insensitively; participants without an entry get 0.
pub fn build_reward_table(roster: &[String], rewards: &[RewardEntry]) -> Vec<RewardRow> {
    let lookup: HashMap<String, f64> = rewards
        .iter()
        .map(|entry| (normalize_address(&entry.address), entry.reward))
        .collect();

    roster
        .iter()
        .map(|miner| RewardRow {
            address: miner.clone(),
            reward: lookup.get(&normalize_address(miner)).copied().unwrap_or(0.0),
        })
        .collect()
}

#[derive(Default)]
struct SessionState {
    /// Registered miners, in backend order
    roster: Vec<String>,
    leaderboard: Vec<LeaderboardEntry>,
    rewards: Vec<RewardRow>,
    /// Registration picker options
    addresses: Vec<String>,
    validator: Option<String>,
    /// Stamp of the current local round
    round: RoundId,
    round_started_at: Option<DateTime<Utc>>,
    /// Submission Set for the current round, normalized address to roster spelling
    submitted: HashMap<String, String>,
    /// Normalized addresses with a submission sent but not yet acknowledged
    pending: HashSet<String>,
    /// Latch so completion fires once per round
    completed: bool,
}

impl SessionState {
    /// Begin a fresh round stamp, forgetting all submissions
    fn advance_round(&mut self) -> RoundId {
        self.round = self.round.next();
        self.submitted.clear();
        self.pending.clear();
        self.completed = false;
        self.round
    }
}

/// Client-side context for the dashboard
pub struct DashboardSession<B> {
    backend: B,
    timer: RoundTimer,
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl<B: Backend> DashboardSession<B> {
    /// Create a session with empty mirrors
    pub fn new(backend: B, timer: RoundTimer) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            timer,
            state: RwLock::new(SessionState::default()),
            events,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn refresh_failed(&self, view: View, error: &BackendError) {
        self.emit(SessionEvent::RefreshFailed {
            view,
            reason: error.to_string(),
        });
    }

    /// Page-load sequence: roster, leaderboard, rewards, picker addresses.
    ///
    /// Failures degrade the affected view and are reported as events.
    pub async fn initialize(&self) {
        self.refresh().await;
        if let Err(e) = self.load_addresses().await {
            self.refresh_failed(View::Addresses, &e);
        }
    }

    /// Reload roster, leaderboard and rewards, degrading on failure
    pub async fn refresh(&self) {
        if let Err(e) = self.load_roster().await {
            self.refresh_failed(View::Roster, &e);
        }
        self.refresh_standings().await;
    }

    // ============ Read-only refreshes ============

    /// Replace the roster mirror; returns the participant total.
    ///
    /// On failure the previous roster is kept.
    pub async fn load_roster(&self) -> Result<usize, BackendError> {
        match self.backend.fetch_roster().await {
            Ok(response) => {
                let total = response.miners.len();
                self.state.write().roster = response.miners;
                tracing::debug!("Roster loaded: {} miners", total);
                Ok(total)
            }
            Err(e) => {
                tracing::warn!("Failed to load roster: {}", e);
                Err(e)
            }
        }
    }

    /// Replace the leaderboard mirror entirely.
    ///
    /// On failure the previous snapshot stays on display.
    pub async fn load_leaderboard(&self) -> Result<usize, BackendError> {
        match self.backend.fetch_leaderboard().await {
            Ok(response) => {
                let count = response.entries.len();
                self.state.write().leaderboard = response.entries;
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("Failed to load leaderboard: {}", e);
                Err(e)
            }
        }
    }

    /// Rebuild the reward table against the current roster.
    ///
    /// On failure the table is left empty.
    pub async fn load_rewards(&self) -> Result<usize, BackendError> {
        match self.backend.fetch_rewards().await {
            Ok(response) => {
                let mut state = self.state.write();
                state.rewards = build_reward_table(&state.roster, &response.rewards);
                Ok(state.rewards.len())
            }
            Err(e) => {
                self.state.write().rewards.clear();
                tracing::error!("Failed to load rewards: {}", e);
                Err(e)
            }
        }
    }

    /// Replace the registration picker options
    pub async fn load_addresses(&self) -> Result<usize, BackendError> {
        match self.backend.fetch_addresses().await {
            Ok(response) => {
                let count = response.addresses.len();
                self.state.write().addresses = response.addresses;
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("Failed to load addresses: {}", e);
                Err(e)
            }
        }
    }

    /// Leaderboard then rewards, logging rather than failing
    async fn refresh_standings(&self) {
        if let Err(e) = self.load_leaderboard().await {
            self.refresh_failed(View::Leaderboard, &e);
        }
        if let Err(e) = self.load_rewards().await {
            self.refresh_failed(View::Rewards, &e);
        }
    }

    // ============ State-changing actions ============

    /// Register a miner, then refresh roster and rewards
    pub async fn register(&self, address: &str) -> Result<(), SyncError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(SyncError::EmptyAddress);
        }

        self.backend
            .register(&RegisterRequest {
                address: address.to_string(),
            })
            .await?;
        tracing::info!("Registered miner {}", address);

        if let Err(e) = self.load_roster().await {
            self.refresh_failed(View::Roster, &e);
        }
        if let Err(e) = self.load_rewards().await {
            self.refresh_failed(View::Rewards, &e);
        }
        Ok(())
    }

    /// Start a new round: stamp it, clear submissions, start the timer.
    ///
    /// Returns `false` and changes nothing if the timer is already running.
    pub fn start_round(&self) -> bool {
        let started_at = Utc::now();
        let round = {
            // timer and round stamp change under one lock, same as reset
            let mut state = self.state.write();
            if !self.timer.start() {
                return false;
            }
            state.round_started_at = Some(started_at);
            state.advance_round()
        };

        tracing::info!("Round {} started at {}", round, started_at.to_rfc3339());
        self.emit(SessionEvent::RoundStarted { round, started_at });
        true
    }

    /// Submit a miner's elapsed time for the current round.
    ///
    /// Only roster members may submit; addresses match case-insensitively
    /// and are sent in their roster spelling. At most one request per
    /// address per round reaches the backend: an address that already
    /// submitted, or has a request in flight, is rejected locally. The
    /// Submission Set only grows on backend success and only if the round
    /// has not changed in the meantime.
    pub async fn submit(&self, address: &str, elapsed_secs: f64) -> Result<SubmitOutcome, SyncError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(SyncError::EmptyAddress);
        }
        let key = normalize_address(address);

        let (round, address) = {
            let mut state = self.state.write();
            let Some(miner) = state
                .roster
                .iter()
                .find(|miner| normalize_address(miner) == key)
                .cloned()
            else {
                tracing::warn!("Submission rejected for unregistered address {}", address);
                return Err(SyncError::NotRegistered(address.to_string()));
            };
            if state.submitted.contains_key(&key) {
                tracing::warn!("Duplicate submission rejected for {}", miner);
                return Err(SyncError::AlreadySubmitted(miner));
            }
            if !state.pending.insert(key.clone()) {
                return Err(SyncError::SubmissionPending(miner));
            }
            (state.round, miner)
        };

        let request = SubmitTimeRequest {
            address: address.clone(),
            time: elapsed_secs,
        };
        let result = self.backend.submit_time(&request).await;

        let recorded = {
            let mut state = self.state.write();
            // a reset already dropped our pending entry
            let same_round = state.round == round;
            if same_round {
                state.pending.remove(&key);
            }
            if let Err(e) = result {
                tracing::warn!("Submission for {} failed: {}", address, e);
                return Err(e.into());
            }
            if same_round {
                state.submitted.insert(key, address.clone());
            }
            same_round
        };

        if !recorded {
            tracing::info!(
                "Discarding stale submission for {} from round {}",
                address,
                round
            );
            self.refresh_standings().await;
            return Ok(SubmitOutcome::Stale);
        }

        tracing::info!("Miner {} submitted {:.3}s in round {}", address, elapsed_secs, round);
        self.emit(SessionEvent::SubmissionAccepted {
            round,
            address: address.clone(),
            time: elapsed_secs,
        });

        self.refresh_standings().await;

        let (complete, submitted, total) = {
            let mut state = self.state.write();
            // only current roster members count towards completion
            let submitted = state
                .roster
                .iter()
                .filter(|miner| state.submitted.contains_key(&normalize_address(miner)))
                .count();
            let total = state.roster.len();
            let complete =
                state.round == round && !state.completed && total > 0 && submitted >= total;
            if complete {
                state.completed = true;
            }
            (complete, submitted, total)
        };

        if !complete {
            return Ok(SubmitOutcome::Accepted { submitted, total });
        }

        self.timer.stop();
        tracing::info!("All {} miners have submitted, round {} complete", submitted, round);
        self.emit(SessionEvent::RoundComplete { round, submitted });

        // final authoritative snapshot
        self.refresh_standings().await;
        Ok(SubmitOutcome::RoundComplete)
    }

    /// Submit using the timer's elapsed time as the measurement
    pub async fn submit_now(&self, address: &str) -> Result<SubmitOutcome, SyncError> {
        let elapsed = self.timer.elapsed().ok_or(SyncError::NoActiveRound)?;
        self.submit(address, elapsed.as_secs_f64()).await
    }

    /// Ask the backend to pick a validator, then refresh rewards
    pub async fn select_validator(&self) -> Result<String, SyncError> {
        let response = self.backend.select_validator().await?;
        let validator = response.validator;

        tracing::info!("Validator selected: {}", validator);
        self.state.write().validator = Some(validator.clone());
        self.emit(SessionEvent::ValidatorSelected {
            validator: validator.clone(),
        });

        if let Err(e) = self.load_rewards().await {
            self.refresh_failed(View::Rewards, &e);
        }
        Ok(validator)
    }

    /// Reset the round on the backend, then locally.
    ///
    /// Stops the timer and clears the Submission Set; never starts a round.
    /// Nothing changes locally if the backend call fails.
    pub async fn reset_round(&self) -> Result<RoundId, SyncError> {
        self.backend.reset_round().await?;

        let round = {
            let mut state = self.state.write();
            state.round_started_at = None;
            self.timer.stop();
            state.advance_round()
        };

        tracing::info!("Round reset, now at {}", round);
        self.emit(SessionEvent::RoundReset { round });

        self.refresh_standings().await;
        Ok(round)
    }

    // ============ Snapshots ============

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn roster(&self) -> Vec<String> {
        self.state.read().roster.clone()
    }

    /// Participant count from the last roster load
    pub fn total_participants(&self) -> usize {
        self.state.read().roster.len()
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.state.read().leaderboard.clone()
    }

    pub fn rewards(&self) -> Vec<RewardRow> {
        self.state.read().rewards.clone()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.state.read().addresses.clone()
    }

    /// Last validator chosen by the backend
    pub fn validator(&self) -> Option<String> {
        self.state.read().validator.clone()
    }

    /// Submission Set of the current round, sorted
    pub fn submitted(&self) -> Vec<String> {
        let mut submitted: Vec<String> = self.state.read().submitted.values().cloned().collect();
        submitted.sort();
        submitted
    }

    pub fn has_submitted(&self, address: &str) -> bool {
        self.state
            .read()
            .submitted
            .contains_key(&normalize_address(address))
    }

    pub fn current_round(&self) -> RoundId {
        self.state.read().round
    }

    pub fn round_started_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().round_started_at
    }

    pub fn is_round_complete(&self) -> bool {
        self.state.read().completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pocp_types::{
        AddressesResponse, LeaderboardResponse, RewardsResponse, RosterResponse, ValidatorResponse,
    };
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn status_error() -> BackendError {
        BackendError::Status {
            status: 500,
            message: "boom".to_string(),
        }
    }

    /// In-memory backend that records calls
    #[derive(Default)]
    struct FakeBackend {
        miners: Mutex<Vec<String>>,
        rewards: Mutex<Vec<RewardEntry>>,
        submissions: Mutex<Vec<SubmitTimeRequest>>,
        registrations: Mutex<Vec<String>>,
        resets: Mutex<usize>,
        fail_rewards: Mutex<bool>,
        fail_writes: Mutex<bool>,
        /// When set, submit_time waits for a notification
        submit_gate: Mutex<Option<Arc<Notify>>>,
        /// When set, fetch_leaderboard yields once before answering
        yield_on_refresh: Mutex<bool>,
    }

    impl FakeBackend {
        fn with_miners(miners: &[&str]) -> Self {
            let backend = Self::default();
            *backend.miners.lock() = miners.iter().map(|m| m.to_string()).collect();
            backend
        }

        fn submit_calls(&self) -> usize {
            self.submissions.lock().len()
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn fetch_roster(&self) -> backend::Result<RosterResponse> {
            Ok(RosterResponse {
                miners: self.miners.lock().clone(),
            })
        }

        async fn fetch_leaderboard(&self) -> backend::Result<LeaderboardResponse> {
            let yield_first = *self.yield_on_refresh.lock();
            if yield_first {
                tokio::task::yield_now().await;
            }
            let entries = self
                .submissions
                .lock()
                .iter()
                .map(|s| LeaderboardEntry {
                    miner: s.address.clone(),
                    time: s.time,
                    cp: 1.0 / s.time,
                })
                .collect();
            Ok(LeaderboardResponse { entries })
        }

        async fn fetch_rewards(&self) -> backend::Result<RewardsResponse> {
            if *self.fail_rewards.lock() {
                return Err(status_error());
            }
            Ok(RewardsResponse {
                rewards: self.rewards.lock().clone(),
            })
        }

        async fn fetch_addresses(&self) -> backend::Result<AddressesResponse> {
            Ok(AddressesResponse {
                addresses: vec!["0xA".to_string(), "0xB".to_string(), "0xC".to_string()],
            })
        }

        async fn register(&self, request: &RegisterRequest) -> backend::Result<()> {
            if *self.fail_writes.lock() {
                return Err(status_error());
            }
            self.registrations.lock().push(request.address.clone());
            self.miners.lock().push(request.address.clone());
            Ok(())
        }

        async fn submit_time(&self, request: &SubmitTimeRequest) -> backend::Result<()> {
            self.submissions.lock().push(request.clone());
            let gate = self.submit_gate.lock().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if *self.fail_writes.lock() {
                return Err(status_error());
            }
            Ok(())
        }

        async fn select_validator(&self) -> backend::Result<ValidatorResponse> {
            if *self.fail_writes.lock() {
                return Err(status_error());
            }
            Ok(ValidatorResponse {
                validator: "0xB".to_string(),
            })
        }

        async fn reset_round(&self) -> backend::Result<()> {
            if *self.fail_writes.lock() {
                return Err(status_error());
            }
            *self.resets.lock() += 1;
            self.submissions.lock().clear();
            Ok(())
        }
    }

    async fn session_with(miners: &[&str]) -> DashboardSession<FakeBackend> {
        let session = DashboardSession::new(FakeBackend::with_miners(miners), RoundTimer::default());
        session.initialize().await;
        session
    }

    #[test]
    fn test_reward_lookup_is_case_insensitive() {
        let roster = vec!["0xABC".to_string()];
        let rewards = vec![RewardEntry {
            address: "0xabc".to_string(),
            reward: 5.0,
        }];

        let table = build_reward_table(&roster, &rewards);
        assert_eq!(table[0].address, "0xABC");
        assert_eq!(table[0].reward, 5.0);
    }

    #[test]
    fn test_missing_rewards_default_to_zero() {
        let roster = vec!["0xA".to_string(), "0xB".to_string()];
        let rewards = vec![RewardEntry {
            address: "0xA".to_string(),
            reward: 3.0,
        }];

        let table = build_reward_table(&roster, &rewards);
        assert_eq!(
            table,
            vec![
                RewardRow { address: "0xA".to_string(), reward: 3.0 },
                RewardRow { address: "0xB".to_string(), reward: 0.0 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_loads_all_views() {
        let session = session_with(&["0xA", "0xB"]).await;
        assert_eq!(session.total_participants(), 2);
        assert_eq!(session.rewards().len(), 2);
        assert_eq!(session.addresses().len(), 3);
        assert!(session.leaderboard().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_submit_is_rejected_locally() {
        let session = session_with(&["0xA", "0xB"]).await;
        session.start_round();

        session.submit("0xA", 1.5).await.unwrap();
        let err = session.submit("0xA", 2.0).await.unwrap_err();
        assert!(matches!(err, SyncError::AlreadySubmitted(ref a) if a == "0xA"));
        assert!(err.is_local());

        assert_eq!(session.backend().submit_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_submits_send_one_request() {
        let session = session_with(&["0xA", "0xB"]).await;
        session.start_round();

        let gate = Arc::new(Notify::new());
        *session.backend().submit_gate.lock() = Some(gate.clone());

        let first = session.submit("0xA", 1.0);
        let second = async {
            tokio::task::yield_now().await;
            let result = session.submit("0xA", 1.1).await;
            gate.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(SyncError::SubmissionPending(_))));
        assert_eq!(session.backend().submit_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_submit_leaves_set_unchanged() {
        let session = session_with(&["0xA", "0xB"]).await;
        session.start_round();
        *session.backend().fail_writes.lock() = true;

        let err = session.submit("0xA", 1.0).await.unwrap_err();
        assert!(matches!(err, SyncError::Backend(_)));
        assert!(!session.has_submitted("0xA"));

        // guard released, a retry goes out
        *session.backend().fail_writes.lock() = false;
        session.submit("0xA", 1.0).await.unwrap();
        assert!(session.has_submitted("0xA"));
        assert_eq!(session.backend().submit_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_completes_once() {
        let session = session_with(&["0xA", "0xB"]).await;
        let mut events = session.subscribe();
        assert!(session.start_round());

        let outcome = session.submit("0xA", 1.0).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted { submitted: 1, total: 2 });
        assert_eq!(session.submitted(), vec!["0xA".to_string()]);
        assert!(session.timer().is_running());
        assert_eq!(session.leaderboard().len(), 1);

        let outcome = session.submit("0xB", 2.0).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::RoundComplete);
        assert_eq!(session.submitted(), vec!["0xA".to_string(), "0xB".to_string()]);
        assert!(!session.timer().is_running());
        assert!(session.is_round_complete());
        assert_eq!(session.leaderboard().len(), 2);

        // further attempts are duplicates, not another completion
        assert!(session.submit("0xB", 3.0).await.is_err());

        let mut completions = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SessionEvent::RoundComplete { .. }) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simultaneous_final_submits_complete_once() {
        let session = session_with(&["0xA", "0xB"]).await;
        let mut events = session.subscribe();
        session.start_round();

        let gate = Arc::new(Notify::new());
        *session.backend().submit_gate.lock() = Some(gate.clone());
        *session.backend().yield_on_refresh.lock() = true;

        let release = async {
            while session.backend().submit_calls() < 2 {
                tokio::task::yield_now().await;
            }
            gate.notify_waiters();
        };
        let (a, b, ()) = tokio::join!(session.submit("0xA", 1.0), session.submit("0xB", 2.0), release);

        let outcomes = [a.unwrap(), b.unwrap()];
        let completions = outcomes
            .iter()
            .filter(|o| **o == SubmitOutcome::RoundComplete)
            .count();
        assert_eq!(completions, 1);
        assert!(outcomes.contains(&SubmitOutcome::Accepted { submitted: 2, total: 2 }));
        assert!(!session.timer().is_running());

        let completed_events = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|e| matches!(e, SessionEvent::RoundComplete { .. }))
            .count();
        assert_eq!(completed_events, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_case_variant_is_the_same_miner() {
        let session = session_with(&["0xA", "0xB"]).await;
        session.start_round();

        session.submit("0xa", 1.0).await.unwrap();
        let err = session.submit("0xA", 2.0).await.unwrap_err();
        assert!(matches!(err, SyncError::AlreadySubmitted(ref a) if a == "0xA"));

        // sent in roster spelling, round still waiting on 0xB
        assert_eq!(session.backend().submissions.lock()[0].address, "0xA");
        assert_eq!(session.submitted(), vec!["0xA".to_string()]);
        assert!(session.has_submitted("0XA"));
        assert!(session.timer().is_running());
        assert!(!session.is_round_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregistered_address_is_rejected_locally() {
        let session = session_with(&["0xA", "0xB"]).await;
        session.start_round();

        let err = session.submit("0xZZ", 1.0).await.unwrap_err();
        assert!(matches!(err, SyncError::NotRegistered(ref a) if a == "0xZZ"));
        assert!(err.is_local());
        assert_eq!(session.backend().submit_calls(), 0);

        let outcome = session.submit("0xA", 1.0).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted { submitted: 1, total: 2 });
        assert!(session.timer().is_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_start_and_reset_stay_in_step_across_threads() {
        let session = Arc::new(session_with(&["0xA", "0xB"]).await);

        let mut tasks = Vec::new();
        for i in 0..32 {
            let session = session.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    session.start_round();
                } else {
                    session.reset_round().await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // a running timer always belongs to a stamped round, and vice versa
        assert_eq!(session.timer().is_running(), session.round_started_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_set_and_does_not_start() {
        let session = session_with(&["0xA", "0xB"]).await;
        session.start_round();
        session.submit("0xA", 1.0).await.unwrap();
        let before = session.current_round();

        let round = session.reset_round().await.unwrap();
        assert!(round > before);
        assert!(session.submitted().is_empty());
        assert!(!session.timer().is_running());
        assert!(session.leaderboard().is_empty());
        assert_eq!(*session.backend().resets.lock(), 1);

        // same miner may submit again once a new round is started
        assert!(session.start_round());
        session.submit("0xA", 1.2).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reset_changes_nothing() {
        let session = session_with(&["0xA", "0xB"]).await;
        session.start_round();
        session.submit("0xA", 1.0).await.unwrap();
        let round = session.current_round();

        *session.backend().fail_writes.lock() = true;
        assert!(session.reset_round().await.is_err());

        assert_eq!(session.current_round(), round);
        assert!(session.has_submitted("0xA"));
        assert!(session.timer().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_submit_after_reset_is_discarded() {
        let session = session_with(&["0xA", "0xB"]).await;
        session.start_round();

        let gate = Arc::new(Notify::new());
        *session.backend().submit_gate.lock() = Some(gate.clone());

        let submit = session.submit("0xA", 1.0);
        let reset = async {
            tokio::task::yield_now().await;
            let round = session.reset_round().await;
            gate.notify_one();
            round
        };
        let (outcome, reset) = tokio::join!(submit, reset);

        assert!(reset.is_ok());
        assert_eq!(outcome.unwrap(), SubmitOutcome::Stale);
        assert!(session.submitted().is_empty());
        assert!(!session.is_round_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_refreshes_roster_and_rewards() {
        let session = session_with(&["0xA"]).await;
        *session.backend().rewards.lock() = vec![RewardEntry {
            address: "0xc".to_string(),
            reward: 10.0,
        }];

        session.register("0xC").await.unwrap();
        assert_eq!(session.roster(), vec!["0xA".to_string(), "0xC".to_string()]);
        assert_eq!(
            session.rewards()[1],
            RewardRow { address: "0xC".to_string(), reward: 10.0 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_empty_address_sends_nothing() {
        let session = session_with(&["0xA"]).await;
        let err = session.register("   ").await.unwrap_err();
        assert!(matches!(err, SyncError::EmptyAddress));
        assert!(session.backend().registrations.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_register_keeps_roster() {
        let session = session_with(&["0xA"]).await;
        *session.backend().fail_writes.lock() = true;
        assert!(session.register("0xB").await.is_err());
        assert_eq!(session.roster(), vec!["0xA".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reward_failure_degrades_without_failing_submit() {
        let session = session_with(&["0xA", "0xB"]).await;
        let mut events = session.subscribe();
        session.start_round();
        *session.backend().fail_rewards.lock() = true;

        session.submit("0xA", 1.0).await.unwrap();
        assert!(session.rewards().is_empty());
        assert!(session.has_submitted("0xA"));

        let degraded = std::iter::from_fn(|| events.try_recv().ok())
            .any(|e| matches!(e, SessionEvent::RefreshFailed { view: View::Rewards, .. }));
        assert!(degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_validator_records_choice() {
        let session = session_with(&["0xA", "0xB"]).await;
        let validator = session.select_validator().await.unwrap();
        assert_eq!(validator, "0xB");
        assert_eq!(session.validator().as_deref(), Some("0xB"));

        *session.backend().fail_writes.lock() = true;
        assert!(session.select_validator().await.is_err());
        assert_eq!(session.validator().as_deref(), Some("0xB"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_round_while_running_is_noop() {
        let session = session_with(&["0xA", "0xB"]).await;
        assert!(session.start_round());
        session.submit("0xA", 1.0).await.unwrap();
        let round = session.current_round();
        let started_at = session.round_started_at();
        assert!(started_at.is_some());

        assert!(!session.start_round());
        assert_eq!(session.round_started_at(), started_at);
        assert_eq!(session.current_round(), round);
        assert!(session.has_submitted("0xA"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_now_requires_started_round() {
        let session = session_with(&["0xA"]).await;
        assert!(matches!(
            session.submit_now("0xA").await,
            Err(SyncError::NoActiveRound)
        ));

        session.start_round();
        tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
        session.submit_now("0xA").await.unwrap();

        let sent = session.backend().submissions.lock()[0].time;
        assert!((sent - 1.5).abs() < 0.01);
    }
}
