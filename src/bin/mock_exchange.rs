/// Mock ABX exchange
///
/// Serves a synthetic packet stream with deliberately dropped sequences so the
/// client's recovery path can be exercised locally.

use abx_client::protocol::DEFAULT_PORT;
use abx_client::{generate_packets, MockExchange, MockExchangeConfig};
use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about = "Mock ABX exchange server")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of packets to generate (sequences 1..=count)
    #[arg(long, default_value_t = 14)]
    count: usize,

    /// Sequences left out of the bulk stream
    #[arg(long, value_delimiter = ',')]
    drop: Vec<i32>,

    /// Sequences refused on resend as well
    #[arg(long, value_delimiter = ',')]
    unavailable: Vec<i32>,

    /// Junk bytes appended to the bulk stream
    #[arg(long, default_value_t = 0)]
    trailing_bytes: usize,

    /// RNG seed for reproducible packets
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abx_client=debug,mock_exchange=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let packets = generate_packets(&mut rng, args.count);

    let config = MockExchangeConfig::new(packets)
        .drop_sequences(args.drop.iter().copied())
        .unavailable_sequences(args.unavailable.iter().copied())
        .with_trailing_bytes(args.trailing_bytes);

    let bind = format!("{}:{}", args.host, args.port);
    let exchange = MockExchange::start(&bind, config).with_context(|| format!("bind {}", bind))?;
    info!(
        addr = %exchange.local_addr(),
        count = args.count,
        dropped = ?args.drop,
        unavailable = ?args.unavailable,
        "mock exchange listening"
    );

    exchange.wait();
    Ok(())
}
