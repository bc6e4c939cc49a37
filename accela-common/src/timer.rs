use std::time::{Duration, Instant};

use crate::metrics::Metrics;

/// Measures elapsed wall time and publishes it to a [`Metrics`] sink.
///
/// The elapsed time is recorded as a double value in milliseconds, under the
/// timer's name.
#[derive(Debug)]
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Creates a timer and starts it.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stops the timer, publishing the elapsed time if a sink is given.
    pub fn stop_timer(self, metrics: Option<&dyn Metrics>) -> Duration {
        let elapsed = self.start.elapsed();

        if let Some(metrics) = metrics {
            metrics.set_double_value(&self.name, elapsed.as_secs_f64() * 1000.0);
        }

        elapsed
    }
}

/// A [`Timer`] which publishes its elapsed time when dropped.
pub struct ScopedTimer<'a> {
    timer: Option<Timer>,
    metrics: &'a dyn Metrics,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(name: impl Into<String>, metrics: &'a dyn Metrics) -> Self {
        Self {
            timer: Some(Timer::new(name)),
            metrics,
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_timer(Some(self.metrics));
        }
    }
}
