//! Hierarchical scoped counters, histograms and timers.
//!
//! A `Metrics` root hands out `Scope`s; scopes nest (`engine.model_a.batch`)
//! and each level aggregates independently so a caller can read either the
//! leaf or any ancestor's rollup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Default)]
struct ScopeData {
    counters: HashMap<String, AtomicU64>,
    histograms: HashMap<String, Mutex<Histogram>>,
}

#[derive(Default, Debug, Clone)]
pub struct Histogram {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Histogram {
    fn observe(&mut self, v: f64) {
        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.count += 1;
        self.sum += v;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }
}

#[derive(Clone)]
pub struct Scope {
    path: String,
    data: Arc<Mutex<ScopeData>>,
    root: Arc<Mutex<HashMap<String, Arc<Mutex<ScopeData>>>>>,
}

impl Scope {
    pub fn child(&self, name: &str) -> Scope {
        let path = format!("{}.{}", self.path, name);
        let data = {
            let mut root = self.root.lock().unwrap();
            root.entry(path.clone()).or_insert_with(|| Arc::new(Mutex::new(ScopeData::default()))).clone()
        };
        Scope { path, data, root: self.root.clone() }
    }

    pub fn incr(&self, name: &str, by: u64) {
        let mut data = self.data.lock().unwrap();
        data.counters.entry(name.to_string()).or_insert_with(|| AtomicU64::new(0)).fetch_add(by, Ordering::Relaxed);
    }

    pub fn counter(&self, name: &str) -> u64 {
        let data = self.data.lock().unwrap();
        data.counters.get(name).map(|c| c.load(Ordering::Relaxed)).unwrap_or(0)
    }

    pub fn observe(&self, name: &str, value: f64) {
        let mut data = self.data.lock().unwrap();
        data.histograms
            .entry(name.to_string())
            .or_insert_with(|| Mutex::new(Histogram::default()))
            .lock()
            .unwrap()
            .observe(value);
    }

    pub fn histogram(&self, name: &str) -> Histogram {
        let data = self.data.lock().unwrap();
        data.histograms.get(name).map(|h| h.lock().unwrap().clone()).unwrap_or_default()
    }

    pub fn timer(&self, name: &str) -> Timer<'_> {
        Timer { scope: self, name: name.to_string(), start: Instant::now() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

pub struct Timer<'a> {
    scope: &'a Scope,
    name: String,
    start: Instant,
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.scope.observe(&self.name, elapsed_ms);
    }
}

#[derive(Clone)]
pub struct Metrics {
    root: Scope,
}

impl Metrics {
    pub fn new() -> Self {
        let registry: Arc<Mutex<HashMap<String, Arc<Mutex<ScopeData>>>>> = Arc::new(Mutex::new(HashMap::new()));
        let data = Arc::new(Mutex::new(ScopeData::default()));
        registry.lock().unwrap().insert("root".to_string(), data.clone());
        Metrics { root: Scope { path: "root".to_string(), data, root: registry } }
    }

    pub fn scope(&self, name: &str) -> Scope {
        self.root.child(name)
    }

    pub fn root(&self) -> Scope {
        self.root.clone()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_aggregate_per_scope() {
        let metrics = Metrics::new();
        let engine = metrics.scope("engine");
        engine.incr("batches", 1);
        engine.incr("batches", 2);
        assert_eq!(engine.counter("batches"), 3);
    }

    #[test]
    fn child_scopes_are_independent() {
        let metrics = Metrics::new();
        let a = metrics.scope("engine").child("model_a");
        let b = metrics.scope("engine").child("model_b");
        a.incr("requests", 5);
        assert_eq!(a.counter("requests"), 5);
        assert_eq!(b.counter("requests"), 0);
    }

    #[test]
    fn histogram_tracks_min_max_mean() {
        let metrics = Metrics::new();
        let scope = metrics.scope("engine");
        scope.observe("batch_size", 2.0);
        scope.observe("batch_size", 4.0);
        scope.observe("batch_size", 6.0);
        let h = scope.histogram("batch_size");
        assert_eq!(h.count, 3);
        assert_eq!(h.min, 2.0);
        assert_eq!(h.max, 6.0);
        assert_eq!(h.mean(), 4.0);
    }
}
