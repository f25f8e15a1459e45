/// In-process mock exchange
///
/// Speaks the ABX protocol over TCP on a background thread. Sequences listed
/// in `dropped` are left out of the bulk stream; sequences in `unavailable`
/// are also refused on resend. Useful for integration tests and local runs.

use crate::codec::Codec;
use crate::packet::Packet;
use crate::protocol::{Request, REQUEST_SIZE};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

const SYMBOLS: [&[u8; 4]; 4] = [b"MSFT", b"AAPL", b"AMZN", b"META"];
const ACCEPT_POLL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Default)]
pub struct MockExchangeConfig {
    pub packets: Vec<Packet>,
    pub dropped: HashSet<i32>,
    pub unavailable: HashSet<i32>,
    /// Junk bytes appended after the last full frame of the bulk stream
    pub trailing_bytes: usize,
}

impl MockExchangeConfig {
    pub fn new(packets: Vec<Packet>) -> Self {
        MockExchangeConfig {
            packets,
            ..Self::default()
        }
    }

    pub fn drop_sequences(mut self, sequences: impl IntoIterator<Item = i32>) -> Self {
        self.dropped.extend(sequences);
        self
    }

    pub fn unavailable_sequences(mut self, sequences: impl IntoIterator<Item = i32>) -> Self {
        self.unavailable.extend(sequences);
        self
    }

    pub fn with_trailing_bytes(mut self, n: usize) -> Self {
        self.trailing_bytes = n;
        self
    }
}

/// Synthetic packets with sequences 1..=count
pub fn generate_packets<R: Rng>(rng: &mut R, count: usize) -> Vec<Packet> {
    let mut price = 100i32;
    (1..=count as i32)
        .map(|seq| {
            price = (price + rng.gen_range(-5..=5)).max(1);
            let side = if rng.gen_bool(0.5) { b'B' } else { b'S' };
            Packet::new(
                *SYMBOLS[rng.gen_range(0..SYMBOLS.len())],
                side,
                rng.gen_range(1..1000),
                price,
                seq,
            )
        })
        .collect()
}

struct State {
    bulk: Vec<u8>,
    by_sequence: BTreeMap<i32, Packet>,
    unavailable: HashSet<i32>,
}

pub struct MockExchange {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockExchange {
    /// Bind and start serving. Use port 0 for an ephemeral port.
    pub fn start(bind: &str, config: MockExchangeConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(bind)?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let mut bulk = Vec::new();
        for packet in config.packets.iter().filter(|p| !config.dropped.contains(&p.sequence)) {
            bulk.extend_from_slice(&Codec::encode(packet));
        }
        bulk.extend(std::iter::repeat(0xAB).take(config.trailing_bytes));

        let state = Arc::new(State {
            bulk,
            by_sequence: config.packets.iter().map(|p| (p.sequence, *p)).collect(),
            unavailable: config.unavailable,
        });

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let handle = thread::spawn(move || accept_loop(listener, state, flag));

        Ok(MockExchange {
            addr,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the accept loop exits (it runs until shutdown)
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("mock exchange accept loop panicked");
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("mock exchange accept loop panicked");
            }
        }
    }
}

impl Drop for MockExchange {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn accept_loop(listener: TcpListener, state: Arc<State>, shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                let state = state.clone();
                thread::spawn(move || {
                    if let Err(e) = serve_connection(stream, &state) {
                        warn!(%peer, error = %e, "mock exchange connection failed");
                    }
                });
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                warn!(error = %e, "mock exchange accept failed");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn serve_connection(mut stream: TcpStream, state: &State) -> io::Result<()> {
    stream.set_nonblocking(false)?;

    let mut request = [0u8; REQUEST_SIZE];
    stream.read_exact(&mut request)?;

    match Request::from_bytes(request) {
        Ok(Request::StreamAll) => {
            debug!(bytes = state.bulk.len(), "serving bulk stream");
            stream.write_all(&state.bulk)?;
        }
        Ok(Request::Resend(seq)) => {
            let seq = seq as i32;
            match state.by_sequence.get(&seq) {
                Some(packet) if !state.unavailable.contains(&seq) => {
                    debug!(sequence = seq, "serving resend");
                    stream.write_all(&Codec::encode(packet))?;
                }
                _ => debug!(sequence = seq, "resend refused"),
            }
        }
        Err(e) => warn!(error = %e, "mock exchange got a bad request"),
    }

    stream.flush()
}
