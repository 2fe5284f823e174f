use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use tracing::debug;

use crate::error::DiscoveryError;
use crate::result::Sighting;

/// The mDNS service type receivers advertise under.
pub const SERVICE_TYPE: &str = "_localsent._tcp.local.";

/// Starts advertising `name` on `port` via mDNS. The returned daemon keeps
/// advertising until it is dropped or [`ServiceDaemon::shutdown`] is
/// called.
pub fn advertise(name: &str, port: u16) -> Result<ServiceDaemon, DiscoveryError> {
    let daemon = ServiceDaemon::new()?;
    let host_name = format!("{name}.local.");
    let info = ServiceInfo::new(SERVICE_TYPE, name, &host_name, "", port, None)?
        .enable_addr_auto();
    daemon.register(info)?;
    Ok(daemon)
}

/// Browses for `SERVICE_TYPE` instances for `timeout`, returning every
/// resolved instance seen.
pub async fn browse(timeout: Duration) -> Result<Vec<Sighting>, DiscoveryError> {
    let daemon = ServiceDaemon::new()?;
    let receiver = daemon.browse(SERVICE_TYPE)?;

    let mut sightings = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        let receiver = receiver.clone();
        let event = match tokio::task::spawn_blocking(move || receiver.recv_timeout(remaining))
            .await
            .expect("mDNS receive task panicked")
        {
            Ok(event) => event,
            Err(_) => break,
        };
        if let ServiceEvent::ServiceResolved(info) = event {
            for addr in info.get_addresses() {
                sightings.push(Sighting {
                    host: addr.to_string(),
                    port: info.get_port(),
                    name: info.get_fullname().to_string(),
                });
            }
        } else {
            debug!(?event, "ignored mDNS event while browsing");
        }
    }

    let _ = daemon.shutdown();
    Ok(sightings)
}
