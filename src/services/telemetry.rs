//! Process-wide request counters feeding the monitoring channel.
//!
//! All shared mutable state lives behind one mutex inside this component;
//! other code only ever calls the record/read methods.

use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Trailing window for the request-rate counter.
const RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TelemetryCounters {
    /// Requests handled since boot.
    pub total_requests: u64,

    /// Requests inside the trailing 60-second window.
    pub requests_last_minute: usize,

    /// Requests currently being handled.
    pub in_flight: u32,

    /// Distinct client addresses seen since boot.
    pub distinct_clients: usize,

    /// Currently connected WebSocket subscribers.
    pub ws_subscribers: u32,
}

#[derive(Debug, Default)]
struct Inner {
    total_requests: u64,
    window: VecDeque<Instant>,
    in_flight: u32,
    clients: HashSet<IpAddr>,
    ws_subscribers: u32,
}

#[derive(Debug)]
pub struct Telemetry {
    started: Instant,
    inner: Mutex<Inner>,
}

impl Telemetry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn request_started(&self, client: Option<IpAddr>) {
        self.request_started_at(client, Instant::now());
    }

    pub fn request_finished(&self) {
        let mut inner = self.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }

    pub fn ws_connected(&self) {
        let mut inner = self.lock();
        inner.ws_subscribers += 1;
    }

    pub fn ws_disconnected(&self) {
        let mut inner = self.lock();
        inner.ws_subscribers = inner.ws_subscribers.saturating_sub(1);
    }

    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    #[must_use]
    pub fn counters(&self) -> TelemetryCounters {
        self.counters_at(Instant::now())
    }

    fn request_started_at(&self, client: Option<IpAddr>, now: Instant) {
        let mut inner = self.lock();
        inner.total_requests += 1;
        inner.in_flight += 1;
        Self::prune(&mut inner, now);
        inner.window.push_back(now);
        if let Some(ip) = client {
            inner.clients.insert(ip);
        }
    }

    fn counters_at(&self, now: Instant) -> TelemetryCounters {
        let mut inner = self.lock();
        Self::prune(&mut inner, now);
        TelemetryCounters {
            total_requests: inner.total_requests,
            requests_last_minute: inner.window.len(),
            in_flight: inner.in_flight,
            distinct_clients: inner.clients.len(),
            ws_subscribers: inner.ws_subscribers,
        }
    }

    /// Lazy pruning: entries older than the window are dropped whenever the
    /// window is read or appended to.
    fn prune(inner: &mut Inner, now: Instant) {
        let Some(cutoff) = now.checked_sub(RATE_WINDOW) else {
            return;
        };
        while let Some(front) = inner.window.front() {
            if *front < cutoff {
                inner.window.pop_front();
            } else {
                break;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_window_drops_old_entries() {
        let telemetry = Telemetry::new();
        let base = Instant::now();

        for _ in 0..5 {
            telemetry.request_started_at(None, base);
            telemetry.request_finished();
        }

        let counters = telemetry.counters_at(base + Duration::from_secs(30));
        assert_eq!(counters.requests_last_minute, 5);
        assert_eq!(counters.total_requests, 5);

        let counters = telemetry.counters_at(base + Duration::from_secs(61));
        assert_eq!(counters.requests_last_minute, 0);
        assert_eq!(counters.total_requests, 5);
    }

    #[test]
    fn test_distinct_clients_and_in_flight() {
        let telemetry = Telemetry::new();
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        telemetry.request_started(Some(a));
        telemetry.request_started(Some(a));
        telemetry.request_started(Some(b));

        let counters = telemetry.counters();
        assert_eq!(counters.distinct_clients, 2);
        assert_eq!(counters.in_flight, 3);

        telemetry.request_finished();
        telemetry.request_finished();
        telemetry.request_finished();
        telemetry.request_finished();

        assert_eq!(telemetry.counters().in_flight, 0);
    }

    #[test]
    fn test_ws_subscriber_gauge() {
        let telemetry = Telemetry::new();
        telemetry.ws_connected();
        telemetry.ws_connected();
        telemetry.ws_disconnected();
        assert_eq!(telemetry.counters().ws_subscribers, 1);
    }
}
