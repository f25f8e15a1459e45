/// ABX Client - Reconciling Market Data Stream Client
///
/// Pulls the full packet stream from an ABX exchange, detects sequence gaps,
/// re-requests each missing packet over its own connection and produces a
/// sequence-ordered view of everything observed. Features include:
/// - 17-byte big-endian packet codec
/// - One-connection-per-request TCP transport with timeouts
/// - Sequence gap detection over a last-write-wins packet table
/// - Per-sequence recovery with unrecovered reasons
/// - JSON output and run statistics
/// - Mock exchange for tests and local runs

pub mod protocol;
pub mod packet;
pub mod codec;
pub mod config;
pub mod transport;
pub mod table;
pub mod gap_detector;
pub mod reconciler;
pub mod stats;
pub mod output;
pub mod mock;

pub use protocol::{CallType, Request, RequestError, PACKET_SIZE, REQUEST_SIZE};
pub use packet::{Packet, Side};
pub use codec::{Codec, FrameError, StreamSummary};
pub use config::ClientConfig;
pub use transport::{TcpTransport, Transport, TransportError, TransportResult};
pub use table::PacketTable;
pub use gap_detector::GapDetector;
pub use reconciler::{ReconcileError, ReconcileReport, Reconciler, Unrecovered, UnrecoveredReason};
pub use stats::{LatencyStats, RunStats};
pub use output::{write_json, write_json_file, OutputError, OutputFormat};
pub use mock::{generate_packets, MockExchange, MockExchangeConfig};
