//! Progress math for the round timer

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Ratio at which the bar leaves the low band
pub const MEDIUM_THRESHOLD: f64 = 0.5;

/// Ratio at which the bar enters the high band
pub const HIGH_THRESHOLD: f64 = 0.8;

/// Presentation band of the progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Band for a progress ratio in `[0, 1]`.
    ///
    /// Lower bounds are inclusive: exactly 0.5 is medium, exactly 0.8 is high.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < MEDIUM_THRESHOLD {
            Severity::Low
        } else if ratio < HIGH_THRESHOLD {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(name)
    }
}

/// `elapsed / nominal`, saturating at 1.0
pub fn progress_ratio(elapsed: Duration, nominal: Duration) -> f64 {
    if nominal.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / nominal.as_secs_f64()).min(1.0)
}

/// Clock-style `MM:SS.mmm` rendering; minutes wrap at the hour
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}

/// One rendered state of the timer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerFrame {
    /// Time since round start
    pub elapsed: Duration,
    /// Formatted elapsed time
    pub label: String,
    /// Bar width in percent, `0..=100`
    pub progress_percent: f64,
    /// `None` when the timer is idle
    pub severity: Option<Severity>,
}

impl TimerFrame {
    /// Neutral frame shown while no round is running
    pub fn idle() -> Self {
        Self {
            elapsed: Duration::ZERO,
            label: format_elapsed(Duration::ZERO),
            progress_percent: 0.0,
            severity: None,
        }
    }

    /// Frame for a running round
    pub fn running(elapsed: Duration, nominal: Duration) -> Self {
        let ratio = progress_ratio(elapsed, nominal);
        Self {
            elapsed,
            label: format_elapsed(elapsed),
            progress_percent: ratio * 100.0,
            severity: Some(Severity::from_ratio(ratio)),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.severity.is_none()
    }
}

impl Default for TimerFrame {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_ratio(0.0), Severity::Low);
        assert_eq!(Severity::from_ratio(0.3), Severity::Low);
        assert_eq!(Severity::from_ratio(0.6), Severity::Medium);
        assert_eq!(Severity::from_ratio(0.9), Severity::High);
        assert_eq!(Severity::from_ratio(1.0), Severity::High);
    }

    #[test]
    fn test_severity_boundaries() {
        assert_eq!(Severity::from_ratio(0.499), Severity::Low);
        assert_eq!(Severity::from_ratio(0.5), Severity::Medium);
        assert_eq!(Severity::from_ratio(0.799), Severity::Medium);
        assert_eq!(Severity::from_ratio(0.8), Severity::High);
    }

    #[test]
    fn test_progress_saturates() {
        let nominal = Duration::from_secs(10);
        assert_eq!(progress_ratio(Duration::from_secs(5), nominal), 0.5);
        assert_eq!(progress_ratio(Duration::from_secs(25), nominal), 1.0);
        assert_eq!(progress_ratio(Duration::from_secs(1), Duration::ZERO), 1.0);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00.000");
        assert_eq!(format_elapsed(Duration::from_millis(3_250)), "00:03.250");
        assert_eq!(format_elapsed(Duration::from_millis(125_007)), "02:05.007");
        // wraps like a clock face
        assert_eq!(format_elapsed(Duration::from_secs(3_601)), "00:01.000");
    }

    #[test]
    fn test_running_frame() {
        let frame = TimerFrame::running(Duration::from_secs(6), Duration::from_secs(10));
        assert_eq!(frame.label, "00:06.000");
        assert!((frame.progress_percent - 60.0).abs() < 1e-9);
        assert_eq!(frame.severity, Some(Severity::Medium));
        assert!(!frame.is_idle());
        assert!(TimerFrame::idle().is_idle());
    }
}
