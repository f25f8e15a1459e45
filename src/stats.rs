/// Run statistics
///
/// Tracks bytes and frames from the bulk stream, how long it took, and the
/// latency of each resend call.

use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p99_us: u64,
}

impl LatencyStats {
    fn from_samples(samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        Some(LatencyStats {
            min_us: sorted[0],
            max_us: sorted[sorted.len() - 1],
            mean_us: sorted.iter().sum::<u64>() as f64 / sorted.len() as f64,
            p50_us: sorted[sorted.len() / 2],
            p99_us: sorted[(sorted.len() * 99) / 100],
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    start_time: Option<Instant>,
    stream_bytes: u64,
    stream_duration: Option<Duration>,
    frames: u64,
    trailing_bytes: u64,

    // Resend latencies (in microseconds)
    resend_latencies: Vec<u64>,
    resend_attempts: u32,
    resend_hits: u32,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn record_stream(&mut self, bytes: usize, elapsed: Duration) {
        self.stream_bytes += bytes as u64;
        self.stream_duration = Some(elapsed);
    }

    pub fn record_frames(&mut self, frames: usize, trailing_bytes: usize) {
        self.frames += frames as u64;
        self.trailing_bytes += trailing_bytes as u64;
    }

    pub fn record_resend(&mut self, elapsed: Duration, hit: bool) {
        self.resend_attempts += 1;
        if hit {
            self.resend_hits += 1;
        }
        self.resend_latencies.push(elapsed.as_micros() as u64);
    }

    pub fn resend_latency_stats(&self) -> Option<LatencyStats> {
        LatencyStats::from_samples(&self.resend_latencies)
    }

    /// Bulk stream throughput in bytes per second
    pub fn stream_bytes_per_sec(&self) -> f64 {
        match self.stream_duration {
            Some(d) if d.as_secs_f64() > 0.0 => self.stream_bytes as f64 / d.as_secs_f64(),
            _ => 0.0,
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|st| st.elapsed())
    }

    pub fn stream_bytes(&self) -> u64 {
        self.stream_bytes
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn trailing_bytes(&self) -> u64 {
        self.trailing_bytes
    }

    pub fn resend_attempts(&self) -> u32 {
        self.resend_attempts
    }

    pub fn resend_hits(&self) -> u32 {
        self.resend_hits
    }

    pub fn log_summary(&self) {
        info!(
            bytes = self.stream_bytes,
            frames = self.frames,
            trailing_bytes = self.trailing_bytes,
            bytes_per_sec = self.stream_bytes_per_sec(),
            elapsed = ?self.elapsed(),
            "stream statistics"
        );

        if let Some(stats) = self.resend_latency_stats() {
            info!(
                attempts = self.resend_attempts,
                hits = self.resend_hits,
                min_us = stats.min_us,
                max_us = stats.max_us,
                mean_us = stats.mean_us,
                p50_us = stats.p50_us,
                p99_us = stats.p99_us,
                "resend statistics"
            );
        }
    }
}
