//! Request and submission counters for the relay service

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::collections::HashMap;
use parking_lot::RwLock;
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct MetricsCollector {
    pub total_requests: Arc<AtomicU64>,
    pub failed_requests: Arc<AtomicU64>,
    pub requests_by_endpoint: Arc<RwLock<HashMap<String, u64>>>,
    pub submissions_accepted: Arc<AtomicU64>,
    pub submissions_rejected: Arc<AtomicU64>,
    pub notifications_failed: Arc<AtomicU64>,
    pub total_response_ms: Arc<AtomicU64>,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub submissions_accepted: u64,
    pub submissions_rejected: u64,
    pub notifications_failed: u64,
    pub average_response_time_ms: f64,
    pub uptime_seconds: i64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            total_requests: Arc::new(AtomicU64::new(0)),
            failed_requests: Arc::new(AtomicU64::new(0)),
            requests_by_endpoint: Arc::new(RwLock::new(HashMap::new())),
            submissions_accepted: Arc::new(AtomicU64::new(0)),
            submissions_rejected: Arc::new(AtomicU64::new(0)),
            notifications_failed: Arc::new(AtomicU64::new(0)),
            total_response_ms: Arc::new(AtomicU64::new(0)),
            start_time: Utc::now(),
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let mut endpoints = self.requests_by_endpoint.write();
        *endpoints.entry(endpoint.to_string()).or_insert(0) += 1;
    }

    pub fn record_response(&self, duration_ms: u128, status: u16) {
        if status >= 400 {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_response_ms
            .fetch_add(u64::try_from(duration_ms).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub fn record_submission_accepted(&self) {
        self.submissions_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission_rejected(&self) {
        self.submissions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification_failed(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let total_ms = self.total_response_ms.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            requests_by_endpoint: self.requests_by_endpoint.read().clone(),
            submissions_accepted: self.submissions_accepted.load(Ordering::Relaxed),
            submissions_rejected: self.submissions_rejected.load(Ordering::Relaxed),
            notifications_failed: self.notifications_failed.load(Ordering::Relaxed),
            average_response_time_ms: if total > 0 { total_ms as f64 / total as f64 } else { 0.0 },
            uptime_seconds: Utc::now().signed_duration_since(self.start_time).num_seconds(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = MetricsCollector::new();
        metrics.record_request("/api/contact");
        metrics.record_request("/api/contact");
        metrics.record_request("/health");
        metrics.record_response(10, 200);
        metrics.record_response(20, 422);
        metrics.record_response(30, 200);
        metrics.record_submission_accepted();
        metrics.record_submission_rejected();

        let snapshot = metrics.get_snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.requests_by_endpoint["/api/contact"], 2);
        assert_eq!(snapshot.submissions_accepted, 1);
        assert_eq!(snapshot.submissions_rejected, 1);
        assert_eq!(snapshot.average_response_time_ms, 20.0);
    }
}
