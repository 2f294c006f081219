//! Round Timer - periodic renderer for the active round
//!
//! A single tokio task ticks at a fixed interval and publishes the current
//! [`TimerFrame`] on a watch channel. Stopping aborts only that task.

use crate::progress::TimerFrame;
use crate::{NOMINAL_ROUND_MS, TICK_MS};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Round timer configuration
#[derive(Clone, Debug)]
pub struct TimerConfig {
    /// Render interval (default: 50ms)
    pub tick: Duration,
    /// Round length that maps to a full bar (default: 10s)
    pub nominal_duration: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(TICK_MS),
            nominal_duration: Duration::from_millis(NOMINAL_ROUND_MS),
        }
    }
}

#[derive(Default)]
struct TimerState {
    /// Start of the most recent round, kept after stop
    started_at: Option<Instant>,
    /// Renderer task, present only while running
    renderer: Option<JoinHandle<()>>,
}

/// Elapsed-time tracker for the current round
pub struct RoundTimer {
    config: TimerConfig,
    state: Mutex<TimerState>,
    frames: Arc<watch::Sender<TimerFrame>>,
}

impl RoundTimer {
    /// Create an idle timer
    pub fn new(config: TimerConfig) -> Self {
        let (frames, _) = watch::channel(TimerFrame::idle());
        Self {
            config,
            state: Mutex::new(TimerState::default()),
            frames: Arc::new(frames),
        }
    }

    /// Start the round clock and its renderer.
    ///
    /// Returns `false` without touching anything if a renderer is already
    /// running. Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if state.renderer.is_some() {
            tracing::debug!("Round timer already running");
            return false;
        }

        let started_at = Instant::now();
        state.started_at = Some(started_at);

        let frames = self.frames.clone();
        // tokio intervals reject a zero period
        let tick = self.config.tick.max(Duration::from_millis(1));
        let nominal = self.config.nominal_duration;

        state.renderer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                frames.send_replace(TimerFrame::running(started_at.elapsed(), nominal));
            }
        }));

        tracing::info!(
            "Round timer started ({}ms ticks, {}ms nominal)",
            tick.as_millis(),
            nominal.as_millis()
        );
        true
    }

    /// Stop the renderer and reset the bar to the idle frame.
    ///
    /// Returns `true` only for the call that actually stopped a running timer.
    pub fn stop(&self) -> bool {
        let renderer = self.state.lock().renderer.take();
        match renderer {
            Some(handle) => {
                handle.abort();
                self.frames.send_replace(TimerFrame::idle());
                tracing::info!("Round timer stopped");
                true
            }
            None => false,
        }
    }

    /// Check if the renderer is running
    pub fn is_running(&self) -> bool {
        self.state.lock().renderer.is_some()
    }

    /// Time since the last start, or `None` if never started
    pub fn elapsed(&self) -> Option<Duration> {
        self.state.lock().started_at.map(|t| t.elapsed())
    }

    /// Most recently published frame
    pub fn current_frame(&self) -> TimerFrame {
        self.frames.borrow().clone()
    }

    /// Subscribe to rendered frames
    pub fn subscribe(&self) -> watch::Receiver<TimerFrame> {
        self.frames.subscribe()
    }
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.state.get_mut().renderer.take() {
            handle.abort();
        }
    }
}
