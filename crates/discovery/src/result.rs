use std::collections::{BTreeMap, BTreeSet};

use crate::normalize::normalize_address;

/// A receiver discovered via mDNS, the UDP broadcast probe, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub port: u16,
    pub names: BTreeSet<String>,
    pub addresses: BTreeSet<String>,
}

impl DiscoveredDevice {
    fn new(port: u16, name: String, address: String) -> Self {
        Self {
            port,
            names: BTreeSet::from([name]),
            addresses: BTreeSet::from([address]),
        }
    }

    fn merge(&mut self, other: Self) {
        self.names.extend(other.names);
        self.addresses.extend(other.addresses);
    }
}

/// One raw sighting of a receiver before merging, carrying the address it
/// was seen at alongside its advertised name and port.
pub struct Sighting {
    pub host: String,
    pub port: u16,
    pub name: String,
}

/// Merges sightings from mDNS and the UDP probe, keyed by the normalized
/// `host:port`: entries sharing a key have their name and address sets
/// unioned. A sighting whose `host` doesn't normalize to an IPv4 dotted-quad
/// (see [`normalize_address`]) is dropped rather than merged in raw form.
#[must_use]
pub fn merge(sightings: Vec<Sighting>) -> Vec<DiscoveredDevice> {
    let mut merged: BTreeMap<(String, u16), DiscoveredDevice> = BTreeMap::new();
    for sighting in sightings {
        let Some(addr) = normalize_address(&sighting.host) else {
            continue;
        };
        let host = addr.to_string();
        let key = (host.clone(), sighting.port);
        let device = DiscoveredDevice::new(sighting.port, sighting.name, host);
        merged
            .entry(key)
            .and_modify(|existing| existing.merge(device.clone()))
            .or_insert(device);
    }
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sightings_sharing_host_and_port_merge_names_and_addresses() {
        let devices = merge(vec![
            Sighting {
                host: "192.168.1.5".into(),
                port: 9999,
                name: "desk".into(),
            },
            Sighting {
                host: "192.168.1.5".into(),
                port: 9999,
                name: "desk-mdns".into(),
            },
        ]);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].names.len(), 2);
    }

    #[test]
    fn distinct_ports_stay_separate() {
        let devices = merge(vec![
            Sighting {
                host: "192.168.1.5".into(),
                port: 9999,
                name: "a".into(),
            },
            Sighting {
                host: "192.168.1.5".into(),
                port: 8888,
                name: "b".into(),
            },
        ]);
        assert_eq!(devices.len(), 2);
    }

    #[test]
    fn sightings_normalize_into_dotted_quad_addresses() {
        let devices = merge(vec![
            Sighting {
                host: "::ffff:192.168.1.5".into(),
                port: 9999,
                name: "desk".into(),
            },
            Sighting {
                host: "192.168.1.5%eth0".into(),
                port: 9999,
                name: "desk-mdns".into(),
            },
        ]);
        assert_eq!(devices.len(), 1);
        assert_eq!(
            devices[0].addresses,
            BTreeSet::from(["192.168.1.5".to_string()])
        );
    }

    #[test]
    fn unnormalizable_host_is_dropped() {
        let devices = merge(vec![Sighting {
            host: "not-an-address".into(),
            port: 9999,
            name: "ghost".into(),
        }]);
        assert!(devices.is_empty());
    }
}
