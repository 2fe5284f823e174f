//! The receiver engine: accepts inbound connections, admits them against
//! pairing state, and drives each through [`session::handle_connection`]
//! (component C8). [`start_receiver`] owns the accept loop and the
//! optional TTL-rotation task; [`StopHandle`] shuts both down gracefully.

pub mod confirm;
pub mod config;
pub mod error;
pub mod resume;
mod session;
pub mod target;

use std::sync::Arc;

use logging_sink::{ProgressSink, TextSink};
use pairing::PairingHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use config::ReceiverConfig;
pub use confirm::{ConfirmDecision, ConfirmFuture, ConfirmHook, ConfirmRequest};
pub use error::DaemonError;
pub use session::SessionContext;

/// How long a graceful shutdown waits for in-flight sessions before the
/// listener task is aborted outright.
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(2);

/// Handle to a running receiver. Dropping it does not stop the receiver;
/// call [`StopHandle::stop`] explicitly.
pub struct StopHandle {
    cancel: CancellationToken,
    accept_task: tokio::task::JoinHandle<()>,
    rotation_task: Option<tokio::task::JoinHandle<()>>,
}

impl StopHandle {
    /// Signals the accept loop to stop taking new connections and gives
    /// in-flight sessions [`SHUTDOWN_GRACE`] to finish before the accept
    /// task is aborted.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Some(rotation_task) = &self.rotation_task {
            rotation_task.abort();
        }
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, self.accept_task).await;
    }
}

enum Acceptor {
    Plain,
    Tls(tokio_rustls::TlsAcceptor),
}

/// Starts the receiver engine: binds `config.port`, advertises nothing on
/// its own (discovery is a separate subsystem), and accepts connections
/// until [`StopHandle::stop`] is called. Returns the pairing state handle
/// so a caller can read the live pair code for display alongside the
/// stop handle.
pub async fn start_receiver(
    config: ReceiverConfig,
) -> Result<(StopHandle, PairingHandle), DaemonError> {
    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;

    let acceptor = match &config.tls {
        Some(identity) => Acceptor::Tls(transport::build_acceptor(identity)?),
        None => Acceptor::Plain,
    };

    let pairing = PairingHandle::new(
        config.pair_code,
        config.rotate_per_transfer,
        config.pair_ttl_seconds.map(std::time::Duration::from_secs),
        config.generator,
    );

    let rotation_task = pairing::spawn_ttl_rotation(
        pairing.clone(),
        config.pair_ttl_seconds,
        config.on_pair_code_change.clone(),
    );

    let ctx = Arc::new(SessionContext {
        output_dir: config.output_dir,
        pairing: pairing.clone(),
        confirm: config.confirm_transfer,
        on_pair_code_change: config.on_pair_code_change,
        progress: Arc::new(TextSink::new(std::io::stdout())) as Arc<dyn ProgressSink>,
    });

    let cancel = CancellationToken::new();
    let accept_task = tokio::spawn(accept_loop(listener, acceptor, ctx, cancel.clone()));

    Ok((
        StopHandle {
            cancel,
            accept_task,
            rotation_task,
        },
        pairing,
    ))
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: Acceptor,
    ctx: Arc<SessionContext>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("receiver accept loop stopping");
                return;
            }
            accepted = listener.accept() => {
                let (tcp, peer_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!("accept failed: {err}");
                        continue;
                    }
                };
                let ctx = ctx.clone();
                let stream_result = match &acceptor {
                    Acceptor::Plain => Ok(transport::accept_plain(tcp)),
                    Acceptor::Tls(tls) => transport::accept_tls(tls, tcp).await,
                };
                tokio::spawn(async move {
                    let stream = match stream_result {
                        Ok(stream) => stream,
                        Err(err) => {
                            warn!(peer = %peer_addr, "TLS handshake failed: {err}");
                            return;
                        }
                    };
                    if let Err(err) = session::handle_connection(stream, peer_addr, &ctx).await {
                        warn!(peer = %peer_addr, "session ended in error: {err}");
                    }
                });
            }
        }
    }
}
