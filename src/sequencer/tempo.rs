use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::shared::{MAX_BPM, MIN_BPM};

pub const DEFAULT_TAP_HISTORY: usize = 8;
pub const DEFAULT_TAP_RESET: Duration = Duration::from_millis(2000);

pub fn clamp_bpm(bpm: i64) -> u16 {
    bpm.clamp(MIN_BPM as i64, MAX_BPM as i64) as u16
}

// Tap tempo works on wall-clock instants: the taps are human input, not
// audio events, so the engine clock has nothing to say about them.
#[derive(Clone, Debug)]
pub struct TapTempo {
    taps: VecDeque<Instant>,
    history: usize,
    reset_after: Duration,
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new(DEFAULT_TAP_HISTORY, DEFAULT_TAP_RESET)
    }
}

impl TapTempo {
    pub fn new(history: usize, reset_after: Duration) -> Self {
        let history = history.max(2);
        Self {
            taps: VecDeque::with_capacity(history),
            history,
            reset_after,
        }
    }

    /// Registers a tap and returns the tempo once there are two or more taps
    /// in the current series.
    pub fn tap(&mut self, now: Instant) -> Option<u16> {
        if let Some(&last) = self.taps.back() {
            // a long gap (or a clock that went backwards) starts a new series
            if now < last || now - last > self.reset_after {
                self.taps.clear();
            }
        }
        self.taps.push_back(now);
        while self.taps.len() > self.history {
            self.taps.pop_front();
        }
        self.bpm()
    }

    pub fn bpm(&self) -> Option<u16> {
        let (first, last) = (self.taps.front()?, self.taps.back()?);
        let intervals = self.taps.len().checked_sub(1).filter(|n| *n > 0)?;
        let mean_ms = (*last - *first).as_secs_f64() * 1000.0 / intervals as f64;
        if mean_ms <= 0.0 {
            return None;
        }
        Some(clamp_bpm((60_000.0 / mean_ms).round() as i64))
    }

    #[cfg(test)]
    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn two_taps_half_a_second_apart_is_120() {
        let t0 = Instant::now();
        let mut tap = TapTempo::default();
        assert_eq!(tap.tap(t0), None);
        assert_eq!(tap.tap(t0 + ms(500)), Some(120));
    }

    #[test]
    fn long_gap_starts_a_new_series() {
        let t0 = Instant::now();
        let mut tap = TapTempo::default();
        tap.tap(t0);
        tap.tap(t0 + ms(500));
        let t2 = t0 + ms(3000);
        assert_eq!(tap.tap(t2), None);
        assert_eq!(tap.tap_count(), 1);
        // only the new series counts
        assert_eq!(tap.tap(t2 + ms(400)), Some(150));
    }

    #[test]
    fn exactly_the_reset_gap_still_counts() {
        let t0 = Instant::now();
        let mut tap = TapTempo::default();
        tap.tap(t0);
        assert_eq!(tap.tap(t0 + ms(2000)), Some(40)); // 30 bpm, clamped
    }

    #[test]
    fn mean_over_a_rolling_window() {
        let t0 = Instant::now();
        let mut tap = TapTempo::default();
        // 12 taps, only the last 8 are kept
        let mut t = t0;
        for i in 0..12 {
            t += if i < 4 { ms(1000) } else { ms(250) };
            tap.tap(t);
        }
        assert_eq!(tap.tap_count(), 8);
        assert_eq!(tap.bpm(), Some(240));
    }

    #[test]
    fn result_is_clamped_to_range() {
        let t0 = Instant::now();
        let mut tap = TapTempo::default();
        tap.tap(t0);
        assert_eq!(tap.tap(t0 + ms(100)), Some(300)); // 600 bpm
        assert_eq!(clamp_bpm(10), 40);
        assert_eq!(clamp_bpm(1000), 300);
        assert_eq!(clamp_bpm(97), 97);
    }

    #[test]
    fn uneven_taps_round() {
        let t0 = Instant::now();
        let mut tap = TapTempo::default();
        tap.tap(t0);
        tap.tap(t0 + ms(480));
        // mean 490ms -> 122.449 -> 122
        assert_eq!(tap.tap(t0 + ms(980)), Some(122));
    }
}
