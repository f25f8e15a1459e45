/// Stream reconciliation
///
/// Pulls the bulk stream, indexes packets by sequence, works out which
/// sequences are missing below the highest one seen, and asks the exchange for
/// each addressable one in turn. Gaps are kept as ranges; only the part a
/// resend request can name is expanded into single sequences. Failures
/// during recovery only lower completeness; failures on the bulk stream end
/// the run.

use crate::codec::Codec;
use crate::gap_detector::range_len;
use crate::packet::Packet;
use crate::protocol::{RequestError, MAX_RESEND_SEQUENCE};
use crate::stats::RunStats;
use crate::table::PacketTable;
use crate::transport::{Transport, TransportError};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("initial stream failed: {0}")]
    Transport(#[from] TransportError),

    #[error("initial stream contained no complete packets")]
    EmptyStream,
}

/// Why a missing sequence is still missing after recovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnrecoveredReason {
    /// The one-byte resend request cannot address this sequence
    OutOfRange,
    /// The exchange answered with less than a full frame
    NotReturned,
    MalformedFrame { len: usize },
    /// The exchange returned a different packet than the one requested
    SequenceMismatch { got: i32 },
    Transport { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unrecovered {
    pub sequence: i32,
    pub reason: UnrecoveredReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// Distinct packets held after the bulk stream
    pub received: usize,
    pub frames_decoded: usize,
    pub duplicates: usize,
    pub trailing_bytes: usize,
    pub max_sequence: i32,
    /// Missing runs before recovery, inclusive (start, end), ascending
    pub gaps: Vec<(i32, i32)>,
    pub missing_total: u64,
    pub recovered: usize,
    /// Addressable sequences whose resend failed
    pub unrecovered: Vec<Unrecovered>,
    /// Missing runs no resend request can address; never requested
    pub out_of_range: Vec<(i32, i32)>,
    /// Final packets, ascending by sequence
    pub packets: Vec<Packet>,
}

impl ReconcileReport {
    pub fn missing_count(&self) -> u64 {
        self.missing_total
    }

    /// Failed resends plus every sequence in the out-of-range runs
    pub fn unrecovered_count(&self) -> u64 {
        self.unrecovered.len() as u64 + self.out_of_range.iter().map(range_len).sum::<u64>()
    }

    /// Sequences whose resend failed (out-of-range runs excluded)
    pub fn unrecovered_sequences(&self) -> Vec<i32> {
        self.unrecovered.iter().map(|u| u.sequence).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.unrecovered.is_empty() && self.out_of_range.is_empty()
    }
}

pub struct Reconciler<T: Transport> {
    transport: T,
    first_sequence: i32,
    stats: RunStats,
}

impl<T: Transport> Reconciler<T> {
    pub fn new(transport: T, first_sequence: i32) -> Self {
        Reconciler {
            transport,
            first_sequence,
            stats: RunStats::new(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Run one full reconciliation
    pub fn run(&mut self) -> Result<ReconcileReport, ReconcileError> {
        self.stats = RunStats::new();
        self.stats.start();

        let mut table = PacketTable::new();

        info!("requesting full packet stream");
        let started = Instant::now();
        let raw = self.transport.stream_all()?;
        self.stats.record_stream(raw.len(), started.elapsed());

        let mut duplicates = 0;
        let summary = Codec::decode_stream(&raw, |packet| {
            if table.insert(packet).is_some() {
                duplicates += 1;
            }
        });
        self.stats.record_frames(summary.frames, summary.trailing_bytes);
        if summary.trailing_bytes > 0 {
            debug!(bytes = summary.trailing_bytes, "discarded truncated tail");
        }

        let max_sequence = table.max_sequence().ok_or(ReconcileError::EmptyStream)?;
        let received = table.len();
        let detector = table.gaps(self.first_sequence);
        let missing_total = detector.total_gaps();
        let addressable = detector.missing_within(0, MAX_RESEND_SEQUENCE);
        let out_of_range = detector.gaps_outside(0, MAX_RESEND_SEQUENCE);

        info!(
            received,
            missing = missing_total,
            gap_ranges = detector.gap_count(),
            max_sequence,
            "initial stream decoded"
        );

        for &(start, end) in &out_of_range {
            warn!(start, end, "gap cannot be requested with a one-byte resend");
        }

        let mut recovered = 0;
        let mut unrecovered = Vec::new();
        for sequence in addressable {
            match self.recover(&mut table, sequence) {
                Ok(()) => {
                    recovered += 1;
                    debug!(sequence, "recovered packet");
                }
                Err(reason) => {
                    warn!(sequence, ?reason, "failed to recover packet");
                    unrecovered.push(Unrecovered { sequence, reason });
                }
            }
        }

        let report = ReconcileReport {
            received,
            frames_decoded: summary.frames,
            duplicates,
            trailing_bytes: summary.trailing_bytes,
            max_sequence,
            gaps: detector.gaps().to_vec(),
            missing_total,
            recovered,
            unrecovered,
            out_of_range,
            packets: table.into_ordered(),
        };

        info!(
            received,
            missing = missing_total,
            recovered,
            unrecovered = report.unrecovered_count(),
            "reconciliation finished"
        );

        Ok(report)
    }

    fn recover(&mut self, table: &mut PacketTable, sequence: i32) -> Result<(), UnrecoveredReason> {
        let started = Instant::now();
        let response = self.transport.resend(sequence);
        self.stats
            .record_resend(started.elapsed(), matches!(response, Ok(Some(_))));

        let frame = match response {
            Ok(Some(frame)) => frame,
            Ok(None) => return Err(UnrecoveredReason::NotReturned),
            Err(TransportError::Request(RequestError::SequenceOutOfRange(_))) => {
                return Err(UnrecoveredReason::OutOfRange)
            }
            Err(e) => {
                return Err(UnrecoveredReason::Transport {
                    message: e.to_string(),
                })
            }
        };

        let packet = Codec::decode(&frame)
            .map_err(|_| UnrecoveredReason::MalformedFrame { len: frame.len() })?;

        // Stored under its own sequence, whatever was asked for
        table.insert(packet);
        if packet.sequence != sequence {
            return Err(UnrecoveredReason::SequenceMismatch {
                got: packet.sequence,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportResult;
    use std::collections::HashMap;

    #[derive(Default)]
    struct ScriptedTransport {
        stream: Vec<u8>,
        resends: HashMap<i32, Vec<u8>>,
        requested: Vec<i32>,
    }

    impl Transport for ScriptedTransport {
        fn stream_all(&mut self) -> TransportResult<Vec<u8>> {
            Ok(self.stream.clone())
        }

        fn resend(&mut self, sequence: i32) -> TransportResult<Option<Vec<u8>>> {
            self.requested.push(sequence);
            Ok(self.resends.get(&sequence).cloned())
        }
    }

    fn frame(seq: i32) -> Vec<u8> {
        Codec::encode(&Packet::new(*b"IBM ", b'B', 10, 200, seq)).to_vec()
    }

    #[test]
    fn test_duplicates_counted() {
        let mut stream = frame(1);
        stream.extend(frame(2));
        stream.extend(frame(1));
        let transport = ScriptedTransport {
            stream,
            ..Default::default()
        };

        let mut reconciler = Reconciler::new(transport, 1);
        let report = reconciler.run().unwrap();
        assert_eq!(report.frames_decoded, 3);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.received, 2);
        assert!(report.is_complete());
    }

    #[test]
    fn test_mismatched_resend_stays_unrecovered() {
        let mut stream = frame(1);
        stream.extend(frame(3));
        let mut resends = HashMap::new();
        resends.insert(2, frame(7));
        let transport = ScriptedTransport {
            stream,
            resends,
            ..Default::default()
        };

        let mut reconciler = Reconciler::new(transport, 1);
        let report = reconciler.run().unwrap();
        assert_eq!(
            report.unrecovered,
            vec![Unrecovered {
                sequence: 2,
                reason: UnrecoveredReason::SequenceMismatch { got: 7 },
            }]
        );
        let sequences: Vec<i32> = report.packets.iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, vec![1, 3, 7]);
    }

    #[test]
    fn test_malformed_resend_frame() {
        let mut resends = HashMap::new();
        resends.insert(1, vec![0u8; 5]);
        let transport = ScriptedTransport {
            stream: frame(2),
            resends,
            ..Default::default()
        };

        let mut reconciler = Reconciler::new(transport, 1);
        let report = reconciler.run().unwrap();
        assert_eq!(
            report.unrecovered[0].reason,
            UnrecoveredReason::MalformedFrame { len: 5 }
        );
        assert_eq!(reconciler.stats().resend_attempts(), 1);
    }
}
