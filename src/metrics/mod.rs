//! Dispatch counters for the navigation engine.
//!
//! Counters saturate instead of wrapping; a snapshot pairs them with the
//! engine's uptime so embedders can emit them through the logging pipeline.

use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct RouterMetrics {
    dispatches: u64,
    scopes_evaluated: u64,
    flushes: u64,
    redirects: u64,
    notifications: u64,
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&mut self, scopes_evaluated: usize) {
        self.dispatches = self.dispatches.saturating_add(1);
        self.scopes_evaluated = self
            .scopes_evaluated
            .saturating_add(scopes_evaluated as u64);
    }

    pub fn record_flush(&mut self) {
        self.flushes = self.flushes.saturating_add(1);
    }

    pub fn record_redirect(&mut self) {
        self.redirects = self.redirects.saturating_add(1);
    }

    pub fn record_notifications(&mut self, count: usize) {
        if count > 0 {
            self.notifications = self.notifications.saturating_add(count as u64);
        }
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            dispatches: self.dispatches,
            scopes_evaluated: self.scopes_evaluated,
            flushes: self.flushes,
            redirects: self.redirects,
            notifications: self.notifications,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub dispatches: u64,
    pub scopes_evaluated: u64,
    pub flushes: u64,
    pub redirects: u64,
    pub notifications: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(
            LogLevel::Info,
            target.to_string(),
            "router_metrics".to_string(),
            self.as_fields(),
        )
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("dispatches".to_string(), json!(self.dispatches));
        map.insert(
            "scopes_evaluated".to_string(),
            json!(self.scopes_evaluated),
        );
        map.insert("flushes".to_string(), json!(self.flushes));
        map.insert("redirects".to_string(), json!(self.redirects));
        map.insert("notifications".to_string(), json!(self.notifications));
        map
    }
}
