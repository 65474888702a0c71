// Relay counters and the /metrics endpoint

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Process-wide relay counters. Only ever incremented.
#[derive(Debug)]
pub struct RelayMetrics {
    started_at: Instant,
    request_count: AtomicU64,
    text_errors: AtomicU64,
    audio_errors: AtomicU64,
    streams_completed: AtomicU64,
    streams_cancelled: AtomicU64,
    chunks_relayed: AtomicU64,
    bytes_relayed: AtomicU64,
    completion_count: AtomicU64,
    total_completion_ms: AtomicU64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            request_count: AtomicU64::new(0),
            text_errors: AtomicU64::new(0),
            audio_errors: AtomicU64::new(0),
            streams_completed: AtomicU64::new(0),
            streams_cancelled: AtomicU64::new(0),
            chunks_relayed: AtomicU64::new(0),
            bytes_relayed: AtomicU64::new(0),
            completion_count: AtomicU64::new(0),
            total_completion_ms: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completion(&self, latency_ms: u64) {
        self.completion_count.fetch_add(1, Ordering::Relaxed);
        self.total_completion_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_text_error(&self) {
        self.text_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_audio_error(&self) {
        self.audio_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk(&self, len: usize) {
        self.chunks_relayed.fetch_add(1, Ordering::Relaxed);
        self.bytes_relayed.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn record_stream_completed(&self) {
        self.streams_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stream_cancelled(&self) {
        self.streams_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_completion_latency_ms(&self) -> f64 {
        let count = self.completion_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.total_completion_ms.load(Ordering::Relaxed);
        total as f64 / count as f64
    }

    pub fn snapshot(&self) -> MetricsResponse {
        MetricsResponse {
            timestamp: Utc::now(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            request_count: self.request_count.load(Ordering::Relaxed),
            text_errors: self.text_errors.load(Ordering::Relaxed),
            audio_errors: self.audio_errors.load(Ordering::Relaxed),
            streams_completed: self.streams_completed.load(Ordering::Relaxed),
            streams_cancelled: self.streams_cancelled.load(Ordering::Relaxed),
            chunks_relayed: self.chunks_relayed.load(Ordering::Relaxed),
            bytes_relayed: self.bytes_relayed.load(Ordering::Relaxed),
            avg_completion_latency_ms: self.avg_completion_latency_ms(),
        }
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub request_count: u64,
    pub text_errors: u64,
    pub audio_errors: u64,
    pub streams_completed: u64,
    pub streams_cancelled: u64,
    pub chunks_relayed: u64,
    pub bytes_relayed: u64,
    pub avg_completion_latency_ms: f64,
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_completion_latency() {
        let metrics = RelayMetrics::new();
        assert_eq!(metrics.avg_completion_latency_ms(), 0.0);

        metrics.record_completion(100);
        metrics.record_completion(300);
        assert_eq!(metrics.avg_completion_latency_ms(), 200.0);
    }

    #[test]
    fn test_chunk_counters() {
        let metrics = RelayMetrics::new();
        metrics.record_chunk(4);
        metrics.record_chunk(6);
        metrics.record_stream_completed();

        let snap = metrics.snapshot();
        assert_eq!(snap.chunks_relayed, 2);
        assert_eq!(snap.bytes_relayed, 10);
        assert_eq!(snap.streams_completed, 1);
        assert_eq!(snap.streams_cancelled, 0);
    }
}
