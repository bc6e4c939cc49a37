//! Named counters and gauges.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// A sink for named metrics.
///
/// Counters are integral, gauges ("double values") are floating point. The
/// two namespaces are independent.
pub trait Metrics: Send + Sync {
    fn set_counter_value(&self, name: &str, value: u64);

    fn get_counter_value(&self, name: &str) -> Option<u64>;

    fn increment_counter_value(&self, name: &str) {
        let value = self.get_counter_value(name).unwrap_or(0);
        self.set_counter_value(name, value.saturating_add(1));
    }

    fn set_double_value(&self, name: &str, value: f64);

    fn get_double_value(&self, name: &str) -> Option<f64>;
}

#[derive(Default, Debug)]
struct MetricValues {
    counters: HashMap<String, u64>,
    doubles: HashMap<String, f64>,
}

/// A [`Metrics`] sink which keeps the latest value of every metric in memory.
#[derive(Default, Debug)]
pub struct InMemoryMetrics {
    values: Mutex<MetricValues>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, MetricValues> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Metrics for InMemoryMetrics {
    fn set_counter_value(&self, name: &str, value: u64) {
        self.values().counters.insert(name.to_owned(), value);
    }

    fn get_counter_value(&self, name: &str) -> Option<u64> {
        self.values().counters.get(name).copied()
    }

    fn increment_counter_value(&self, name: &str) {
        let mut values = self.values();
        let counter = values.counters.entry(name.to_owned()).or_insert(0);
        *counter = counter.saturating_add(1);
    }

    fn set_double_value(&self, name: &str, value: f64) {
        self.values().doubles.insert(name.to_owned(), value);
    }

    fn get_double_value(&self, name: &str) -> Option<f64> {
        self.values().doubles.get(name).copied()
    }
}
