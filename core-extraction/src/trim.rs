//! # Trim Window
//!
//! The requested time range expressed on the source track's clock. Both
//! output strategies share this one implementation of the trimming rules, so
//! boundary semantics cannot drift between them.

/// Half-open extraction window `[start, start + wanted)` in microseconds.
#[derive(Debug, Clone, Copy)]
pub struct TrimWindow {
    start_us: u64,
    wanted_us: u64,
}

impl TrimWindow {
    /// Derive the window from a request. A requested duration of `0` means
    /// through the end of the track; if the track duration is unknown too,
    /// the window is unbounded.
    pub fn new(start_us: u64, requested_duration_us: u64, track_duration_us: u64) -> Self {
        let wanted_us = if requested_duration_us > 0 {
            requested_duration_us
        } else {
            track_duration_us.saturating_sub(start_us)
        };
        Self { start_us, wanted_us }
    }

    pub fn start_us(&self) -> u64 {
        self.start_us
    }

    /// Total duration the output should cover; `0` when unbounded.
    pub fn wanted_us(&self) -> u64 {
        self.wanted_us
    }

    /// Rebased timestamp relative to the window start. Samples a coarse seek
    /// landed before the start clamp to `0`.
    pub fn relative(&self, pts_us: u64) -> u64 {
        pts_us.saturating_sub(self.start_us)
    }

    /// Exclusive upper bound on output timestamps: a sample whose rebased
    /// timestamp reaches the wanted duration is dropped, not truncated.
    pub fn is_past_end(&self, relative_us: u64) -> bool {
        self.wanted_us > 0 && relative_us >= self.wanted_us
    }

    /// Feed-side bound for the decode path: the straddling sample whose
    /// absolute timestamp exceeds `start + wanted` is not fed, keeping the
    /// decoded output length within the window.
    pub fn exceeds_input_bound(&self, pts_us: u64) -> bool {
        self.wanted_us > 0 && pts_us > self.start_us + self.wanted_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_duration_wins() {
        let window = TrimWindow::new(5_000_000, 3_000_000, 60_000_000);
        assert_eq!(window.wanted_us(), 3_000_000);
    }

    #[test]
    fn zero_duration_runs_to_track_end() {
        let window = TrimWindow::new(5_000_000, 0, 60_000_000);
        assert_eq!(window.wanted_us(), 55_000_000);
    }

    #[test]
    fn unknown_track_duration_is_unbounded() {
        let window = TrimWindow::new(5_000_000, 0, 0);
        assert_eq!(window.wanted_us(), 0);
        assert!(!window.is_past_end(u64::MAX));
        assert!(!window.exceeds_input_bound(u64::MAX));
    }

    #[test]
    fn end_bound_is_exclusive() {
        let window = TrimWindow::new(1_000_000, 2_000_000, 10_000_000);
        assert!(!window.is_past_end(1_999_999));
        assert!(window.is_past_end(2_000_000));
    }

    #[test]
    fn pre_start_samples_rebase_to_zero() {
        let window = TrimWindow::new(1_000_000, 0, 10_000_000);
        assert_eq!(window.relative(400_000), 0);
        assert_eq!(window.relative(1_500_000), 500_000);
    }

    #[test]
    fn input_bound_is_strictly_greater() {
        let window = TrimWindow::new(0, 2_000_000, 10_000_000);
        assert!(!window.exceeds_input_bound(2_000_000));
        assert!(window.exceeds_input_bound(2_000_001));
    }
}
