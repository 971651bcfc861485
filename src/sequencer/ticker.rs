use std::time::{Duration, Instant};

// Wall-clock side of the scheduler. It only decides *when to look*; a fired
// tick re-arms itself from the instant it fired, so a late poll shifts the
// following ticks instead of bunching them up to catch a fixed grid.
#[derive(Clone, Debug)]
pub struct Ticker {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self { interval, next_due: None }
    }

    // The caller runs the first pass itself; the ticker takes over after one
    // interval.
    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearms_from_fire_time() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(25));
        assert!(!ticker.fire(t0));

        ticker.arm(t0);
        assert!(!ticker.fire(t0 + Duration::from_millis(10)));
        assert!(ticker.fire(t0 + Duration::from_millis(25)));
        assert!(!ticker.fire(t0 + Duration::from_millis(40)));

        // a late poll pushes the next deadline out from the late instant
        let late = t0 + Duration::from_millis(60);
        assert!(ticker.fire(late));
        assert_eq!(ticker.time_until_due(late), Some(Duration::from_millis(25)));
        assert!(!ticker.fire(late + Duration::from_millis(24)));
    }

    #[test]
    fn cancel_disarms() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(25));
        ticker.arm(t0);
        ticker.cancel();
        assert!(!ticker.is_armed());
        assert!(!ticker.fire(t0 + Duration::from_secs(1)));
        assert_eq!(ticker.time_until_due(t0), None);
    }
}
