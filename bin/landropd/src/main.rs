//! Long-running receiver daemon for unattended deployment (a systemd
//! service, say): unlike `landrop recv`'s one-shot interactive session,
//! this binary logs rather than prints and stops only on a termination
//! signal.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use core::{ReceiverConfig, TlsServerConfig};
use logging::Verbosity;
use tracing::info;

/// landropd: accept inbound transfers until terminated.
#[derive(Debug, Parser)]
#[command(name = "landropd", version, about)]
struct Args {
    /// Directory to write received files into.
    output_dir: PathBuf,
    /// Port to listen on.
    #[arg(short, long, default_value_t = core::config::DEFAULT_PORT)]
    port: u16,
    /// Advertised/logged service name.
    #[arg(long, default_value_t = core::config::DEFAULT_SERVICE_NAME.to_string())]
    service_name: String,
    /// Require this pair code from senders.
    #[arg(long)]
    pair_code: Option<String>,
    /// Generate a random pair code and log it before accepting.
    #[arg(long)]
    generate_pair_code: bool,
    /// Rotate the pair code after every successful transfer.
    #[arg(long)]
    rotate_per_transfer: bool,
    /// Rotate the pair code on this interval in seconds.
    #[arg(long)]
    pair_ttl_seconds: Option<u64>,
    /// TLS certificate path (requires --tls-key-path).
    #[arg(long, requires = "tls_key_path")]
    tls_cert_path: Option<PathBuf>,
    /// TLS private key path (requires --tls-cert-path).
    #[arg(long, requires = "tls_cert_path")]
    tls_key_path: Option<PathBuf>,
    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_tracing(Verbosity::from_occurrences(args.verbose)).ok();

    let mut config = ReceiverConfig::new(args.port, args.output_dir, args.service_name);
    config.pair_code = args.pair_code;
    config.generate_pair_code = args.generate_pair_code;
    config.rotate_per_transfer = args.rotate_per_transfer;
    config.pair_ttl_seconds = args.pair_ttl_seconds;
    if let (Some(cert_path), Some(key_path)) = (args.tls_cert_path, args.tls_key_path) {
        config.tls = Some(TlsServerConfig { cert_path, key_path });
    }

    let (stop_handle, pairing) = match core::start_receiver(config).await {
        Ok(started) => started,
        Err(err) => {
            tracing::error!("failed to start receiver: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(code) = pairing.current_code() {
        info!(pair_code = %code, "receiver accepting connections");
    } else {
        info!("receiver accepting connections");
    }

    wait_for_termination().await;
    info!("shutting down");
    stop_handle.stop().await;
    ExitCode::SUCCESS
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    tokio::signal::ctrl_c().await.ok();
}
