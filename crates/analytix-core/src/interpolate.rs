//! Linear progress ramp sampled against a monotonic clock.
//!
//! [`Interpolation`] is the pure part: value as a function of elapsed time.
//! [`run_ramp`] drives it on a frame ticker until it converges.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Ramp from `from` to `to` over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpolation {
    pub from: u8,
    pub to: u8,
    pub duration: Duration,
}

impl Interpolation {
    pub fn new(from: u8, to: u8, duration: Duration) -> Self {
        Self { from, to, duration }
    }

    /// Fraction of the ramp covered after `elapsed`, in `[0, 1]`.
    pub fn ratio(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Rounded progress value after `elapsed`.
    pub fn sample(&self, elapsed: Duration) -> u8 {
        let from = f64::from(self.from);
        let to = f64::from(self.to);
        let value = (from + (to - from) * self.ratio(elapsed)).round();
        value.clamp(0.0, 100.0) as u8
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        self.ratio(elapsed) >= 1.0
    }
}

/// Sample `interp` once per `frame` and hand each value to `sink`.
///
/// Stops when the ramp is complete, when `cancel` fires, or when `sink`
/// returns `false`. Returns the last value delivered, if any.
pub async fn run_ramp(
    interp: Interpolation,
    frame: Duration,
    cancel: CancellationToken,
    mut sink: impl FnMut(u8) -> bool,
) -> Option<u8> {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(frame);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = None;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let elapsed = started.elapsed();
        let value = interp.sample(elapsed);
        if !sink(value) {
            break;
        }
        last = Some(value);
        if interp.is_complete(elapsed) {
            break;
        }
    }

    last
}
