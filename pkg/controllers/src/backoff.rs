//! Exponential backoff with jitter for polling loops.

use pkg_constants::nodedaemon::{
    DRAIN_BACKOFF_CAP_MS, DRAIN_BACKOFF_FACTOR, DRAIN_BACKOFF_INITIAL_MS, DRAIN_BACKOFF_JITTER,
    DRAIN_BACKOFF_STEPS,
};
use rand::Rng;
use std::time::Duration;

/// Polling schedule: at most `steps` checks, the first one immediate,
/// separated by waits that start at `initial` and grow by `factor`. The
/// schedule ends with the last wait that fits under `cap`.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub initial: Duration,
    pub factor: f64,
    /// Each wait is stretched by a random fraction in `[0, jitter)`.
    pub jitter: f64,
    pub cap: Duration,
    pub steps: u32,
}

impl Backoff {
    /// Schedule used while waiting for retired daemon pods to disappear.
    pub fn drain() -> Self {
        Self {
            initial: Duration::from_millis(DRAIN_BACKOFF_INITIAL_MS),
            factor: DRAIN_BACKOFF_FACTOR,
            jitter: DRAIN_BACKOFF_JITTER,
            cap: Duration::from_millis(DRAIN_BACKOFF_CAP_MS),
            steps: DRAIN_BACKOFF_STEPS,
        }
    }

    /// Waits between consecutive checks, before jitter.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let cap = self.cap.as_secs_f64();
        std::iter::successors(Some(self.initial.as_secs_f64().min(cap)), move |d| {
            Some(d * self.factor)
        })
        .take_while(move |d| *d <= cap)
        .map(Duration::from_secs_f64)
        .take(self.steps.saturating_sub(1) as usize)
    }

    pub fn attempts(&self) -> Attempts {
        Attempts {
            delays: self.delays().collect::<Vec<_>>().into_iter(),
            jitter: self.jitter,
            steps: self.steps,
            made: 0,
        }
    }
}

/// Iteration over the checks of one [`Backoff`] run.
///
/// ```ignore
/// let mut attempts = backoff.attempts();
/// while attempts.next().await {
///     if condition().await? { break; }
/// }
/// ```
#[derive(Debug)]
pub struct Attempts {
    delays: std::vec::IntoIter<Duration>,
    jitter: f64,
    steps: u32,
    made: u32,
}

impl Attempts {
    /// Wait until the next check is due. Returns `false` once the budget is
    /// spent; the first call returns `true` without sleeping.
    pub async fn next(&mut self) -> bool {
        if self.made >= self.steps {
            return false;
        }
        if self.made > 0 {
            let Some(delay) = self.delays.next() else {
                return false;
            };
            tokio::time::sleep(jittered(delay, self.jitter)).await;
        }
        self.made += 1;
        true
    }

    /// Number of checks granted so far.
    pub fn made(&self) -> u32 {
        self.made
    }
}

fn jittered(delay: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 {
        return delay;
    }
    let factor = 1.0 + rand::thread_rng().gen_range(0.0..jitter);
    Duration::from_secs_f64(delay.as_secs_f64() * factor)
}
