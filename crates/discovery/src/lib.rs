//! Peer discovery over mDNS and a UDP broadcast probe (component C6).

mod error;
mod mdns;
pub mod normalize;
mod result;
mod udp;

pub use error::DiscoveryError;
pub use result::DiscoveredDevice;
pub use udp::{MAGIC, UDP_PORT};

use std::time::Duration;

use tracing::info;

/// Default browse timeout when the caller does not specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Filtering policy for [`browse`]. Defaults match the documented
/// behavior: self-sightings and loopback addresses are dropped, and only
/// RFC1918 addresses are kept.
#[derive(Debug, Clone, Copy)]
pub struct DiscoverOptions {
    pub include_self: bool,
    pub include_loopback: bool,
    pub only_lan_ipv4: bool,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            include_self: false,
            include_loopback: false,
            only_lan_ipv4: true,
        }
    }
}

/// A running advertiser: keeps the mDNS registration and UDP responder
/// alive until dropped.
pub struct Advertiser {
    _mdns: ::mdns_sd::ServiceDaemon,
    udp_shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    udp_task: tokio::task::JoinHandle<()>,
}

impl Advertiser {
    /// Stops advertising, waiting for the UDP responder task to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.udp_shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.udp_task).await;
    }
}

/// Advertises `name` on `port` via mDNS and the UDP probe responder
/// (component C6, advertise side).
pub fn advertise(name: &str, port: u16) -> Result<Advertiser, DiscoveryError> {
    let daemon = mdns::advertise(name, port)?;
    let (tx, rx) = tokio::sync::oneshot::channel();
    let responder_name = name.to_string();
    let udp_task = tokio::spawn(async move {
        if let Err(e) = udp::run_responder(responder_name, port, rx).await {
            tracing::warn!(error = %e, "discovery UDP responder stopped");
        }
    });
    Ok(Advertiser {
        _mdns: daemon,
        udp_shutdown: Some(tx),
        udp_task,
    })
}

/// Browses for receivers via mDNS and the UDP broadcast probe in
/// parallel, merges the results, filters to eligible addresses per
/// `options`, and (unless `options.include_self`) drops any device that is
/// this host itself.
pub async fn browse(
    timeout: Duration,
    options: DiscoverOptions,
) -> Result<Vec<DiscoveredDevice>, DiscoveryError> {
    let (mdns_result, udp_result) = tokio::join!(mdns::browse(timeout), udp::run_probe(timeout));

    let mut sightings = mdns_result.unwrap_or_default();
    sightings.extend(udp_result.unwrap_or_default());

    let locals = normalize::local_addresses();
    let devices: Vec<DiscoveredDevice> = result::merge(sightings)
        .into_iter()
        .filter(|device| {
            if options.include_self {
                return true;
            }
            let addresses: Vec<String> = device.addresses.iter().cloned().collect();
            !normalize::is_self("", &addresses, &locals)
        })
        .filter(|device| {
            // addresses are already normalized dotted-quads by `result::merge`
            device.addresses.iter().filter_map(|a| a.parse().ok()).any(|addr| {
                normalize::is_eligible_with(addr, options.only_lan_ipv4, options.include_loopback)
            })
        })
        .collect();

    info!(count = devices.len(), "discovery browse complete");
    Ok(devices)
}
