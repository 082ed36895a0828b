//! Byte counts and timings collected by a session.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use uuid::Uuid;

/// One completed chunk as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkStats {
    /// 1-based position of the chunk in the session.
    pub index: u64,
    /// Payload bytes received for this chunk.
    pub bytes: u64,
    /// Time from sending the request to receiving the last payload byte.
    pub elapsed: Duration,
}

/// Outcome of a completed client session.
///
/// Chunks are folded into running totals as they complete, so the report
/// stays the same size however many chunks a session requests.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Server the session talked to.
    pub peer: SocketAddr,
    /// Local end of the connection.
    pub local: SocketAddr,
    /// Chunks completed.
    pub chunk_count: u64,
    /// Sum of all chunk payload bytes.
    pub total_bytes: u64,
    /// Wall-clock time of the request loop, delays included.
    pub elapsed: Duration,
    min_latency: Option<Duration>,
    max_latency: Option<Duration>,
    latency_sum_nanos: u128,
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

impl SessionReport {
    pub(crate) fn new(peer: SocketAddr, local: SocketAddr) -> Self {
        SessionReport {
            peer,
            local,
            chunk_count: 0,
            total_bytes: 0,
            elapsed: Duration::ZERO,
            min_latency: None,
            max_latency: None,
            latency_sum_nanos: 0,
        }
    }

    pub(crate) fn record(&mut self, chunk: ChunkStats) {
        self.chunk_count += 1;
        self.total_bytes += chunk.bytes;
        self.latency_sum_nanos += chunk.elapsed.as_nanos();
        self.min_latency = Some(self.min_latency.map_or(chunk.elapsed, |m| m.min(chunk.elapsed)));
        self.max_latency = Some(self.max_latency.map_or(chunk.elapsed, |m| m.max(chunk.elapsed)));
    }

    /// Average goodput over the whole session in megabits per second.
    pub fn throughput_mbps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_bytes as f64 * 8.0 / secs / 10u64.pow(6) as f64
    }

    /// Fastest chunk round trip.
    pub fn min_chunk_latency(&self) -> Option<Duration> {
        self.min_latency
    }

    /// Slowest chunk round trip.
    pub fn max_chunk_latency(&self) -> Option<Duration> {
        self.max_latency
    }

    /// Mean chunk round trip.
    pub fn avg_chunk_latency(&self) -> Option<Duration> {
        if self.chunk_count == 0 {
            return None;
        }
        // The mean never exceeds the slowest chunk, so it fits a Duration.
        let avg = self.latency_sum_nanos / self.chunk_count as u128;
        Some(Duration::new(
            (avg / NANOS_PER_SEC) as u64,
            (avg % NANOS_PER_SEC) as u32,
        ))
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session {} -> {}", self.local, self.peer)?;
        writeln!(
            f,
            "  {} chunks, {} bytes in {:.3} s ({:.2} Mbps)",
            self.chunk_count,
            self.total_bytes,
            self.elapsed.as_secs_f64(),
            self.throughput_mbps()
        )?;
        if let (Some(min), Some(avg), Some(max)) = (
            self.min_chunk_latency(),
            self.avg_chunk_latency(),
            self.max_chunk_latency(),
        ) {
            writeln!(f, "  chunk latency min/avg/max: {min:?}/{avg:?}/{max:?}")?;
        }
        write!(f, "Received {} bytes.", self.total_bytes)
    }
}

/// What the server did for one accepted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    /// Random id tagging this connection's log lines.
    pub session_id: Uuid,
    /// Client address.
    pub peer: SocketAddr,
    /// Requests answered.
    pub requests: u64,
    /// Payload bytes written.
    pub bytes_sent: u64,
}

impl fmt::Display for ConnectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} requests, {} bytes sent",
            self.session_id, self.peer, self.requests, self.bytes_sent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(latencies_ms: &[u64], chunk_len: u64) -> SessionReport {
        let mut r = SessionReport::new(
            "127.0.0.1:1234".parse().unwrap(),
            "127.0.0.1:40000".parse().unwrap(),
        );
        for (i, ms) in latencies_ms.iter().enumerate() {
            r.record(ChunkStats {
                index: i as u64 + 1,
                bytes: chunk_len,
                elapsed: Duration::from_millis(*ms),
            });
        }
        r
    }

    #[test]
    fn totals_and_latencies() {
        let mut r = report(&[10, 30, 20], 1_000);
        r.elapsed = Duration::from_secs(1);
        assert_eq!(r.total_bytes, 3_000);
        assert_eq!(r.min_chunk_latency(), Some(Duration::from_millis(10)));
        assert_eq!(r.max_chunk_latency(), Some(Duration::from_millis(30)));
        assert_eq!(r.avg_chunk_latency(), Some(Duration::from_millis(20)));
        assert_eq!(r.throughput_mbps(), 0.024);
    }

    #[test]
    fn average_survives_more_than_u32_max_chunks() {
        let mut r = report(&[], 0);
        r.chunk_count = 1 << 32;
        r.latency_sum_nanos = (1u128 << 32) * 1_500_000_000;
        r.min_latency = Some(Duration::from_millis(1_500));
        r.max_latency = Some(Duration::from_millis(1_500));
        assert_eq!(r.avg_chunk_latency(), Some(Duration::from_millis(1_500)));
    }

    #[test]
    fn report_holds_only_running_totals() {
        let r = report(&[7; 10_000], 0);
        assert_eq!(r.chunk_count, 10_000);
        assert_eq!(r.avg_chunk_latency(), Some(Duration::from_millis(7)));
        assert!(!std::mem::needs_drop::<SessionReport>());
    }

    #[test]
    fn empty_session_has_no_latency_and_zero_throughput() {
        let r = report(&[], 1_000);
        assert_eq!(r.total_bytes, 0);
        assert_eq!(r.avg_chunk_latency(), None);
        assert_eq!(r.throughput_mbps(), 0.0);
        assert!(r.to_string().ends_with("Received 0 bytes."));
    }
}
