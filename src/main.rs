use abx_client::config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_FIRST_SEQUENCE, DEFAULT_HOST, DEFAULT_READ_TIMEOUT,
    DEFAULT_WRITE_TIMEOUT,
};
use abx_client::output::DEFAULT_OUTPUT_PATH;
use abx_client::protocol::DEFAULT_PORT;
use abx_client::{write_json_file, ClientConfig, OutputFormat, Reconciler, TcpTransport};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about = "Fetch, reconcile and save the ABX packet stream")]
struct Args {
    /// Exchange host
    #[arg(long, env = "ABX_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Exchange port
    #[arg(long, env = "ABX_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Output file path
    #[arg(long, short, env = "ABX_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Output document shape
    #[arg(long, value_enum, default_value_t = OutputFormat::Packets)]
    format: OutputFormat,

    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64)]
    connect_timeout_ms: u64,

    /// Idle timeout for each read
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT.as_millis() as u64)]
    read_timeout_ms: u64,

    #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT.as_millis() as u64)]
    write_timeout_ms: u64,

    /// Sequence the exchange starts numbering from
    #[arg(long, default_value_t = DEFAULT_FIRST_SEQUENCE, allow_negative_numbers = true)]
    first_sequence: i32,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            first_sequence: self.first_sequence,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abx_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = args.client_config();

    info!(addr = %config.address(), "connecting to ABX exchange");
    let mut reconciler = Reconciler::new(TcpTransport::new(config.clone()), config.first_sequence);
    let report = reconciler
        .run()
        .with_context(|| format!("reconcile stream from {}", config.address()))?;
    reconciler.stats().log_summary();

    info!(
        received = report.received,
        missing = report.missing_count(),
        unrecovered = report.unrecovered_count(),
        "summary"
    );
    if !report.is_complete() {
        warn!(sequences = ?report.unrecovered_sequences(), "some sequences could not be recovered");
    }

    write_json_file(&report, args.format, &args.output)
        .with_context(|| format!("write {}", args.output.display()))?;
    info!(path = %args.output.display(), packets = report.packets.len(), "ticker data saved");

    Ok(())
}
