use tokio::time::{Duration, Instant};

use crate::types::Liquidation;

/// Transient whale-alert state.
///
/// Armed whenever a liquidation's notional reaches the threshold; decays
/// after the configured window unless a later qualifying event re-arms it
/// first. The connection supervisor is the only writer, so "latest wins"
/// reduces to comparing wakeups against the stored deadline.
#[derive(Debug)]
pub struct WhaleAlert {
    threshold: f64,
    decay: Duration,
    active: bool,
    deadline: Option<Instant>,
}

impl WhaleAlert {
    pub fn new(threshold: f64, decay: Duration) -> Self {
        Self {
            threshold,
            decay,
            active: false,
            deadline: None,
        }
    }

    /// Feed one event through the evaluator; returns the flag afterwards.
    ///
    /// Sub-threshold events (including zero or non-finite notionals) leave
    /// both the flag and any pending deadline untouched.
    pub fn observe(&mut self, event: &Liquidation, now: Instant) -> bool {
        if event.notional.is_finite() && event.notional >= self.threshold {
            self.active = true;
            self.deadline = Some(now + self.decay);
        }
        self.active
    }

    /// Deadline the supervisor should sleep until, if the alert is armed.
    pub fn deadline(&self) -> Option<Instant> {
        if self.active { self.deadline } else { None }
    }

    /// Clear the flag if `now` has reached the armed deadline.
    ///
    /// A wakeup scheduled for a superseded deadline lands here with
    /// `now < deadline` and changes nothing.
    pub fn expire(&mut self, now: Instant) -> bool {
        if let Some(deadline) = self.deadline {
            if now >= deadline {
                self.active = false;
                self.deadline = None;
            }
        }
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    const WINDOW: Duration = Duration::from_millis(2000);

    fn liq(notional: f64) -> Liquidation {
        Liquidation {
            id: "BTCUSDT-0-0".into(),
            symbol: "BTCUSDT".into(),
            side: Side::LongLiquidated,
            quantity: 1.0,
            price: notional,
            notional,
            exchange_ts_ms: 0,
        }
    }

    #[test]
    fn below_threshold_never_arms() {
        let mut alert = WhaleAlert::new(100_000.0, WINDOW);
        let t0 = Instant::now();

        assert!(!alert.observe(&liq(99_999.99), t0));
        assert!(!alert.observe(&liq(0.0), t0));
        assert!(!alert.observe(&liq(f64::NAN), t0));
        assert!(alert.deadline().is_none());
    }

    #[test]
    fn threshold_arms_and_decays_at_deadline() {
        let mut alert = WhaleAlert::new(100_000.0, WINDOW);
        let t0 = Instant::now();

        assert!(alert.observe(&liq(100_000.0), t0));
        assert!(alert.expire(t0 + Duration::from_millis(1999)));
        assert!(!alert.expire(t0 + WINDOW));
        assert!(alert.deadline().is_none());
    }

    #[test]
    fn rearm_extends_the_window() {
        let mut alert = WhaleAlert::new(100_000.0, WINDOW);
        let t0 = Instant::now();

        alert.observe(&liq(150_000.0), t0);
        // Re-arm at t+1s supersedes the t+2s deadline.
        alert.observe(&liq(120_000.0), t0 + Duration::from_millis(1000));

        // The stale t+2s wakeup must not clear the re-armed alert.
        assert!(alert.expire(t0 + Duration::from_millis(2000)));
        assert!(alert.expire(t0 + Duration::from_millis(2999)));
        assert!(!alert.expire(t0 + Duration::from_millis(3000)));
    }

    #[test]
    fn sub_threshold_event_does_not_touch_pending_timer() {
        let mut alert = WhaleAlert::new(100_000.0, WINDOW);
        let t0 = Instant::now();

        alert.observe(&liq(150_000.0), t0);
        let deadline = alert.deadline();

        alert.observe(&liq(50_000.0), t0 + Duration::from_millis(500));
        assert_eq!(alert.deadline(), deadline);
        assert!(alert.is_active());
    }
}
