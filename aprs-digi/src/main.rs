//! APRS Digipeater
//!
//! Command-line front end for the path router. Reads TNC2 packet lines,
//! routes them and writes the packets to repeat on stdout.

mod digipeater;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use aprs_packet::{Callsign, Packet, PacketCodec};
use aprs_route::{parse_rules, Router};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt, Stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use digipeater::{Digipeater, Disposition};
use settings::Settings;

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "aprsroute=info,aprs_packet=info,aprs_route=info";

#[derive(Parser)]
#[command(name = "aprsroute", version, about = "APRS digipeater path router")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route packets given as arguments, or read line by line from stdin
    Route(RouteArgs),
    /// Parse packets and print them back in canonical form
    Check {
        /// Packets in TNC2 text form
        #[arg(required = true)]
        packets: Vec<String>,
    },
}

#[derive(Args)]
struct RouteArgs {
    /// Router callsign, e.g. DIGI or DIGI-1
    #[arg(short, long)]
    callsign: Option<Callsign>,

    /// Comma-separated alias rules, e.g. WIDE1,WIDE2-2,RELAY
    #[arg(short, long)]
    rules: Option<String>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the routing actions applied to each repeated packet
    #[arg(short, long)]
    diagnostics: bool,

    /// Packets to route; stdin is read when none are given
    packets: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Route(args) => run_route(args).await,
        Command::Check { packets } => check(&packets),
    }
}

async fn run_route(args: RouteArgs) -> Result<()> {
    let mut settings = Settings::load(args.config.as_deref())?;
    let rules = args
        .rules
        .as_deref()
        .map(parse_rules)
        .transpose()
        .context("Invalid --rules")?;
    settings.apply_overrides(args.callsign, rules, args.diagnostics);

    let config = settings.router_config()?;
    tracing::info!(
        "Routing as {} with rules [{}]",
        config.callsign,
        config
            .rules
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    );

    let mut digi = Digipeater::new(
        Router::new(config),
        settings.dedupe_window(),
        settings.max_packet_bytes,
    );
    let mut stdout = tokio::io::stdout();

    if args.packets.is_empty() {
        route_stdin(&mut digi, &mut stdout).await?;
    } else {
        for text in &args.packets {
            match Packet::parse(text) {
                Ok(packet) => emit(&mut stdout, text, digi.process(&packet)).await?,
                Err(e) => tracing::warn!("Failed to parse packet {:?}: {}", text, e),
            }
        }
    }
    stdout.flush().await?;

    let stats = digi.stats();
    tracing::info!(
        "Received {}, repeated {}, ignored {}, duplicates {}, too large {}",
        stats.received,
        stats.repeated,
        stats.ignored,
        stats.duplicates,
        stats.too_large
    );
    Ok(())
}

async fn route_stdin(digi: &mut Digipeater, stdout: &mut Stdout) -> Result<()> {
    let mut stdin = tokio::io::stdin();
    let mut codec = PacketCodec::new();
    let mut buf = [0u8; 1024];

    loop {
        let n = stdin.read(&mut buf).await.context("Failed to read stdin")?;
        if n == 0 {
            // Terminate a final line that had no newline
            codec.push_bytes(b"\n");
        } else {
            codec.push_bytes(&buf[..n]);
        }

        while let Some((packet, line)) = codec.next_packet_with_line() {
            emit(stdout, &line, digi.process(&packet)).await?;
        }

        if n == 0 {
            return Ok(());
        }
    }
}

async fn emit(stdout: &mut Stdout, received: &str, disposition: Disposition) -> Result<()> {
    match disposition {
        Disposition::Repeat { text, annotations } => {
            for line in annotations {
                eprintln!("{}", line);
            }
            stdout.write_all(text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        Disposition::Duplicate => tracing::debug!("Duplicate: {}", received),
        Disposition::Ignored(reason) => tracing::debug!("Not repeated ({}): {}", reason, received),
        Disposition::TooLarge { required } => {
            tracing::warn!("Routed packet needs {} bytes, dropped: {}", required, received)
        }
    }
    Ok(())
}

fn check(packets: &[String]) -> Result<()> {
    let mut failed = 0;
    for text in packets {
        match Packet::parse(text) {
            Ok(packet) => println!("{}", packet),
            Err(e) => {
                eprintln!("{}: {}", text, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} packets failed to parse", failed, packets.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter_names_workspace_crates() {
        let targets: Vec<&str> = DEFAULT_LOG_FILTER
            .split(',')
            .filter_map(|directive| directive.split('=').next())
            .collect();
        assert_eq!(targets, ["aprsroute", "aprs_packet", "aprs_route"]);
        assert_eq!(env!("CARGO_CRATE_NAME"), "aprsroute");
    }
}
