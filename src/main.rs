//! RTP stream statistics collector
//!
//! Run with:
//!   tshark -i ens32 -Y rtp -q -T fields -e frame.time_epoch -e ip.src -e ip.dst \
//!     -e udp.srcport -e udp.dstport -e rtp.seq -e rtp.timestamp -e rtp.ssrc \
//!     -E header=y -E separator=, | rtp-stream-stats
//!
//! or let the collector spawn tshark itself:
//!   rtp-stream-stats --interface ens32 --sink console --sink json-lines --json-output streams.jsonl
//!
//! Settings are read from `appsettings.json` (if present) and overridden by flags.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use rtp_stream_stats::{CaptureSource, Collector, CollectorConfig, Error, Settings, SinkKind};

#[derive(Debug, Parser)]
#[command(name = "rtp-stream-stats", version, about)]
struct Cli {
    /// Settings file (JSON); ignored if it does not exist
    #[arg(long, default_value = "appsettings.json")]
    config: PathBuf,

    /// Seconds of silence after which a stream is published
    #[arg(long, value_name = "SECONDS")]
    threshold: Option<u64>,

    /// Seconds between idle-stream scans
    #[arg(long, value_name = "SECONDS")]
    scan_interval: Option<u64>,

    /// Media clock rate used for jitter (Hz)
    #[arg(long, value_name = "HZ")]
    clock_rate: Option<u32>,

    /// Sink to publish to; repeat for several, published in order
    #[arg(long = "sink", value_enum)]
    sinks: Vec<SinkKind>,

    /// Output file for the json-lines sink
    #[arg(long, value_name = "PATH")]
    json_output: Option<PathBuf>,

    /// Connection string for the mysql sink
    #[arg(long, value_name = "URL")]
    mysql_connection_string: Option<String>,

    /// Replay a capture file instead of reading stdin
    #[arg(long, value_name = "PATH", conflicts_with = "interface")]
    file: Option<PathBuf>,

    /// Spawn tshark on this interface instead of reading stdin
    #[arg(long, value_name = "IFACE")]
    interface: Option<String>,
}

impl Cli {
    /// Overlay command-line flags on `config`
    fn apply(self, mut config: CollectorConfig) -> CollectorConfig {
        if let Some(secs) = self.threshold {
            config.publish_threshold = Duration::from_secs(secs);
        }
        if let Some(secs) = self.scan_interval {
            config.scan_interval = Duration::from_secs(secs);
        }
        if let Some(hz) = self.clock_rate {
            config.clock_rate = hz;
        }
        if !self.sinks.is_empty() {
            config.sinks = self.sinks;
        }
        if let Some(path) = self.json_output {
            config.json_output_path = Some(path);
        }
        if let Some(connection_string) = self.mysql_connection_string {
            config.mysql_connection_string = Some(connection_string);
        }
        if let Some(path) = self.file {
            config.capture = CaptureSource::File { path };
        } else if let Some(interface) = self.interface {
            config.capture = CaptureSource::Tshark { interface };
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rtp_stream_stats=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Collector failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let settings = Settings::load_optional(&cli.config)?;
    let config = cli.apply(settings.apply(CollectorConfig::default()));
    config.validate()?;

    let fanout = config.build_fanout()?;
    tracing::info!(
        threshold_secs = config.publish_threshold.as_secs(),
        scan_interval_secs = config.scan_interval.as_secs(),
        clock_rate = config.clock_rate,
        sinks = ?fanout.sink_names(),
        "Collector configured"
    );

    let mut input = config.capture.open().await?;
    let collector = Collector::new(&config, fanout);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    let result = collector.run(input.reader(), shutdown).await;
    input.finish().await?;

    let summary = result?;
    tracing::info!(
        packets = summary.packets,
        skipped = summary.skipped,
        evicted = summary.evicted,
        drained = summary.drained,
        failed_deliveries = summary.failed_deliveries,
        "Collector finished"
    );
    Ok(())
}
