use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use trustscan::aggression::AggressionLevel;
use trustscan::config::ScanConfig;
use trustscan::output::{self, OutputFormat};
use trustscan::ports::{self, PortRange};
use trustscan::targets::TargetSpec;
use trustscan::types::ResultSet;
use trustscan::{logging, scanner};

/// trustscan — TCP reachability and banner scanner with a tiered aggression model.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "trustscan",
    version,
    about = "TCP reachability and banner scanner with a tiered aggression model.",
    long_about = None
)]
struct Cli {
    /// Host name or address to scan.
    #[arg(required_unless_present = "range", conflicts_with = "range")]
    host: Option<String>,

    /// IPv4 range varying in the last octet, e.g. 192.168.1.1-192.168.1.10.
    #[arg(long, value_parser = TargetSpec::parse_range)]
    range: Option<TargetSpec>,

    /// First port to probe.
    #[arg(long, default_value = "1", value_parser = ports::parse_port_str)]
    start: u16,

    /// Last port to probe (inclusive).
    #[arg(long, default_value = "1024", value_parser = ports::parse_port_str)]
    end: u16,

    /// Send a minimal request to open ports and keep the first response line.
    #[arg(long, default_value_t = false)]
    banner: bool,

    /// Write results to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the output file as a JSON array instead of plain lines.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// 0-2: sequential with 500/200/100ms delay; 3: 10 parallel; 4: 50 parallel.
    #[arg(long, default_value = "1", allow_hyphen_values = true)]
    aggression: String,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "connect-timeout-ms", default_value_t = 200)]
    connect_timeout_ms: u64,

    /// Banner read timeout in milliseconds.
    #[arg(long = "read-timeout-ms", default_value_t = 300)]
    read_timeout_ms: u64,

    /// Safety-net bound on waiting for a host's parallel probes, in seconds.
    #[arg(long = "join-timeout-secs", default_value_t = 3600)]
    join_timeout_secs: u64,

    /// Extra random pause of up to this many milliseconds between sequential probes.
    #[arg(long = "jitter-ms", default_value_t = 0)]
    jitter_ms: u64,

    /// Seed for the jitter source.
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = build_config(&cli)?;

    println!("trustscan configuration:");
    println!("  target       : {}", config.target);
    println!(
        "  ports        : {}-{}",
        config.ports.start(),
        config.ports.end()
    );
    println!(
        "  aggression   : {} (concurrency {}, delay {}ms)",
        config.aggression,
        config.aggression.concurrency(),
        config.aggression.delay().as_millis()
    );
    println!("  banner       : {}", config.grab_banner);
    println!(
        "  output       : {}",
        cli.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!();

    // Ctrl-C stops scheduling new probes; results found so far are kept.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel_ctrlc.cancel();
    });

    let results = scanner::scan_with_cancel(&config, cancel).await;
    print_summary(&results);

    if let Some(path) = cli.output.as_deref() {
        let format = if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Lines
        };
        match output::write_results(path, &results, format) {
            Ok(()) => println!("Wrote results to {}", path.display()),
            Err(e) => eprintln!("{e}"),
        }
    } else if cli.json {
        warn!("--json has no effect without --output");
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<ScanConfig> {
    let target = match (&cli.range, &cli.host) {
        (Some(range), _) => range.clone(),
        (None, Some(host)) => TargetSpec::single(host.clone()),
        (None, None) => anyhow::bail!("no target given; pass a host or --range"),
    };
    let ports = PortRange::new(cli.start, cli.end)?;

    let aggression = match AggressionLevel::try_from_input(&cli.aggression) {
        Some(level) => level,
        None => {
            warn!(input = %cli.aggression, "invalid aggression level, using 1");
            AggressionLevel::default()
        }
    };

    Ok(ScanConfig::new(target)
        .ports(ports)
        .grab_banner(cli.banner)
        .aggression(aggression)
        .connect_timeout(Duration::from_millis(cli.connect_timeout_ms))
        .read_timeout(Duration::from_millis(cli.read_timeout_ms))
        .join_timeout(Duration::from_secs(cli.join_timeout_secs))
        .jitter(Duration::from_millis(cli.jitter_ms), cli.seed)
        .live_output(true))
}

fn print_summary(results: &ResultSet) {
    println!(
        "\nOpen ports: {} (probed: {})",
        results.len(),
        results.probed
    );
}
