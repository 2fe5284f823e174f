use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::error::DiscoveryError;
use crate::result::Sighting;

/// The UDP port both the advertiser and the browse probe use.
pub const UDP_PORT: u16 = 37_374;

/// Magic payload identifying a discovery probe datagram.
pub const MAGIC: &str = "LOCAL_SENT_DISCOVER_V1";

#[derive(Debug, Serialize, Deserialize)]
struct ProbeReply {
    magic: String,
    name: String,
    port: u16,
}

fn reuse_address_socket(bind_addr: SocketAddr) -> std::io::Result<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&bind_addr.into())?;
    Ok(socket)
}

/// Binds UDP 37374 in reuse-address mode and answers any datagram whose
/// payload equals [`MAGIC`] with `{ magic, name, port }`, until `shutdown`
/// resolves.
pub async fn run_responder(
    name: String,
    port: u16,
    mut shutdown: tokio::sync::oneshot::Receiver<()>,
) -> Result<(), DiscoveryError> {
    let socket = reuse_address_socket(SocketAddr::new(std::net::Ipv4Addr::UNSPECIFIED.into(), UDP_PORT))?;
    let socket = UdpSocket::from_std(socket.into())?;

    let reply = serde_json::to_vec(&ProbeReply {
        magic: MAGIC.to_string(),
        name,
        port,
    })
    .expect("ProbeReply always serializes");

    let mut buf = [0_u8; 256];
    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            received = socket.recv_from(&mut buf) => {
                let (len, from) = received?;
                if &buf[..len] == MAGIC.as_bytes() {
                    if let Err(e) = socket.send_to(&reply, from).await {
                        warn!(error = %e, "failed to reply to discovery probe");
                    }
                } else {
                    debug!(from = %from, "ignored non-magic discovery datagram");
                }
            }
        }
    }
}

/// Sends the magic probe to the broadcast address and collects replies for
/// `timeout`.
pub async fn run_probe(timeout: Duration) -> Result<Vec<Sighting>, DiscoveryError> {
    let socket = reuse_address_socket(SocketAddr::new(std::net::Ipv4Addr::UNSPECIFIED.into(), 0))?;
    socket
        .set_broadcast(true)
        .map_err(DiscoveryError::BroadcastSendFailed)?;
    let socket = UdpSocket::from_std(socket.into())?;

    let broadcast: SocketAddr = ([255, 255, 255, 255], UDP_PORT).into();
    socket
        .send_to(MAGIC.as_bytes(), broadcast)
        .await
        .map_err(DiscoveryError::BroadcastSendFailed)?;

    let mut sightings = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;
    let mut buf = [0_u8; 256];
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => {
                if let Ok(reply) = serde_json::from_slice::<ProbeReply>(&buf[..len]) {
                    if reply.magic == MAGIC {
                        sightings.push(Sighting {
                            host: from.ip().to_string(),
                            port: reply.port,
                            name: reply.name,
                        });
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "discovery probe socket error");
                break;
            }
            Err(_elapsed) => break,
        }
    }
    Ok(sightings)
}
