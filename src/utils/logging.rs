use log::{log_enabled, warn, Level};
use std::time::{Duration, Instant};

/// Simple scoped timer for tracing the phases of a world step.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Option<Instant>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        let start = if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
            Some(Instant::now())
        } else {
            None
        };
        Self { label, start }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            log::trace!("end {} ({} µs)", self.label, start.elapsed().as_micros());
        }
    }
}

/// Warns when replaying `frames` frames took longer than `budget_ms`.
///
/// Returns whether the budget was exceeded.
pub fn warn_if_replay_over_budget(frames: u64, duration: Duration, budget_ms: f32) -> bool {
    let elapsed_ms = duration.as_secs_f32() * 1000.0;
    if elapsed_ms > budget_ms {
        warn!(
            "Replaying {frames} frames took {elapsed_ms:.2} ms (budget {budget_ms:.2} ms)"
        );
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_check_reports_overrun() {
        assert!(warn_if_replay_over_budget(10, Duration::from_millis(20), 5.0));
        assert!(!warn_if_replay_over_budget(10, Duration::from_millis(1), 5.0));
    }
}
