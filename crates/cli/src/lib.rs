//! `send`, `recv`, and `discover` subcommands, translated into one
//! [`core::SenderConfig`]/[`core::ReceiverConfig`] call plus a
//! `logging-sink`-rendered progress stream to stdout.

mod error;

pub use error::CliError;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use core::{DiscoverOptions, ReceiverConfig, SenderConfig, TlsClientConfig, TlsServerConfig};
use logging::Verbosity;
use logging_sink::{ProgressSink, TextSink};

/// landrop: send and receive files over the LAN.
#[derive(Debug, Parser)]
#[command(name = "landrop", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a file or directory to a receiver.
    Send {
        /// File or directory to send.
        path: PathBuf,
        /// Receiver host or address.
        host: String,
        /// Receiver port.
        #[arg(short, long, default_value_t = core::config::DEFAULT_PORT)]
        port: u16,
        /// Shared pair code the receiver is admitting.
        #[arg(long)]
        pair_code: Option<String>,
        /// Enable TLS.
        #[arg(long)]
        tls: bool,
        /// Skip certificate verification entirely (testing only).
        #[arg(long)]
        insecure: bool,
        /// Require the receiver's certificate to match this SHA-256 fingerprint.
        #[arg(long)]
        fingerprint: Option<String>,
        /// Trust the receiver's certificate on first use, pinning it after.
        #[arg(long)]
        trust_on_first_use: bool,
        /// Known-hosts file to use with `--trust-on-first-use`.
        #[arg(long)]
        known_hosts_path: Option<PathBuf>,
    },
    /// Receive one batch of files into a directory, then exit.
    Recv {
        /// Directory to write received files into.
        output_dir: PathBuf,
        /// Port to listen on.
        #[arg(short, long, default_value_t = core::config::DEFAULT_PORT)]
        port: u16,
        /// Require this pair code from senders.
        #[arg(long)]
        pair_code: Option<String>,
        /// Generate a random pair code and print it before accepting.
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
    },
    /// Browse the LAN for advertised receivers.
    Discover {
        /// How long to listen for replies, in milliseconds.
        #[arg(long, default_value_t = 3000)]
        timeout_ms: u64,
        /// Include this host's own addresses in the results.
        #[arg(long)]
        include_self: bool,
        /// Include loopback addresses in the results.
        #[arg(long)]
        include_loopback: bool,
    },
}

/// Runs the parsed command to completion, writing progress and outcome
/// lines to stdout in the format collaborators parse.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    logging::init_tracing(Verbosity::from_occurrences(cli.verbose)).ok();

    match cli.command {
        Command::Send {
            path,
            host,
            port,
            pair_code,
            tls,
            insecure,
            fingerprint,
            trust_on_first_use,
            known_hosts_path,
        } => {
            let entries = core::build_transfer_entries(&path)?;
            let mut config = SenderConfig::new(host, port);
            config.pair_code = pair_code;
            if tls {
                config.tls = Some(TlsClientConfig {
                    enabled: true,
                    insecure,
                    fingerprint,
                    trust_on_first_use,
                    known_hosts_path,
                });
            }

            let sink = TextSink::new(std::io::stdout());
            let result = core::send_entries(&entries, config, &sink).await;
            match result {
                Ok(batch) => {
                    sink.emit_line(&logging_sink::format_send_done(
                        batch.file_count,
                        batch.total_bytes,
                        batch.resumed_bytes,
                    ));
                    Ok(())
                }
                Err(err) => {
                    sink.emit_line(&logging_sink::format_error(&err.to_string()));
                    Err(err.into())
                }
            }
        }

        Command::Recv {
            output_dir,
            port,
            pair_code,
            generate_pair_code,
            rotate_per_transfer,
            pair_ttl_seconds,
            tls_cert_path,
            tls_key_path,
        } => {
            let mut config = ReceiverConfig::new(port, output_dir, "landrop");
            config.pair_code = pair_code;
            config.generate_pair_code = generate_pair_code;
            config.rotate_per_transfer = rotate_per_transfer;
            config.pair_ttl_seconds = pair_ttl_seconds;
            if let (Some(cert_path), Some(key_path)) = (tls_cert_path, tls_key_path) {
                config.tls = Some(TlsServerConfig { cert_path, key_path });
            }

            let (stop_handle, pairing) = core::start_receiver(config).await?;
            if let Some(code) = pairing.current_code() {
                println!("[recv] pair code: {code}");
            }

            tokio::signal::ctrl_c().await.ok();
            stop_handle.stop().await;
            Ok(())
        }

        Command::Discover {
            timeout_ms,
            include_self,
            include_loopback,
        } => {
            let options = DiscoverOptions {
                include_self,
                include_loopback,
                only_lan_ipv4: true,
            };
            let devices = core::discover_devices(Duration::from_millis(timeout_ms), options).await?;
            for device in &devices {
                let names = device.names.iter().cloned().collect::<Vec<_>>().join(",");
                let addresses = device.addresses.iter().cloned().collect::<Vec<_>>().join(",");
                println!("[discover] {names} {addresses}:{}", device.port);
            }
            Ok(())
        }
    }
}
