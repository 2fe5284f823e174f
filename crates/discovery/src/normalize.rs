use std::net::Ipv4Addr;

/// Normalizes an address string as received from mDNS or a UDP reply:
/// unwraps an IPv4-mapped IPv6 form, strips a zone-id suffix, and parses
/// it as a dotted-quad. Returns `None` for anything that isn't a plausible
/// IPv4 address after normalization.
#[must_use]
pub fn normalize_address(raw: &str) -> Option<Ipv4Addr> {
    let without_zone = raw.split('%').next().unwrap_or(raw);
    let unwrapped = without_zone
        .strip_prefix("::ffff:")
        .unwrap_or(without_zone);
    unwrapped.parse::<Ipv4Addr>().ok()
}

/// Whether `addr` is eligible for discovery results under the default
/// policy: RFC1918 private space only, excluding loopback and
/// link-local (`169.254.0.0/16`) addresses.
#[must_use]
pub fn is_eligible(addr: Ipv4Addr) -> bool {
    is_eligible_with(addr, true, false)
}

/// Whether `addr` is eligible for discovery results under a caller-chosen
/// policy. `only_lan_ipv4` restricts to RFC1918 space; `include_loopback`
/// allows `127.0.0.0/8` through (useful for same-host testing). Link-local
/// (`169.254.0.0/16`) is always excluded regardless of either flag.
#[must_use]
pub fn is_eligible_with(addr: Ipv4Addr, only_lan_ipv4: bool, include_loopback: bool) -> bool {
    if addr.is_loopback() {
        return include_loopback;
    }
    let octets = addr.octets();
    if octets[0] == 169 && octets[1] == 254 {
        return false;
    }
    !only_lan_ipv4 || is_rfc1918(addr)
}

fn is_rfc1918(addr: Ipv4Addr) -> bool {
    let [a, b, ..] = addr.octets();
    match a {
        10 => true,
        172 => (16..=31).contains(&b),
        192 => b == 168,
        _ => false,
    }
}

/// Enumerates this host's own IPv4 addresses, for self-filtering browse
/// results.
pub fn local_addresses() -> Vec<Ipv4Addr> {
    if_addrs::get_if_addrs()
        .map(|ifaces| {
            ifaces
                .into_iter()
                .filter_map(|iface| match iface.addr.ip() {
                    std::net::IpAddr::V4(v4) => Some(v4),
                    std::net::IpAddr::V6(_) => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Whether `host` (as a raw address string) or any address in `addresses`
/// matches one of this machine's own IPv4 addresses.
#[must_use]
pub fn is_self(host: &str, addresses: &[String], locals: &[Ipv4Addr]) -> bool {
    let candidates = std::iter::once(host).chain(addresses.iter().map(String::as_str));
    candidates
        .filter_map(normalize_address)
        .any(|addr| locals.contains(&addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_ipv4_mapped_ipv6() {
        assert_eq!(
            normalize_address("::ffff:192.168.1.5"),
            Some(Ipv4Addr::new(192, 168, 1, 5))
        );
    }

    #[test]
    fn strips_zone_suffix() {
        assert_eq!(
            normalize_address("169.254.1.1%eth0"),
            Some(Ipv4Addr::new(169, 254, 1, 1))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(normalize_address("not-an-address"), None);
    }

    #[test]
    fn private_ranges_are_eligible() {
        assert!(is_eligible(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(is_eligible(Ipv4Addr::new(172, 16, 0, 1)));
        assert!(is_eligible(Ipv4Addr::new(172, 31, 255, 255)));
        assert!(is_eligible(Ipv4Addr::new(192, 168, 0, 1)));
        assert!(!is_eligible(Ipv4Addr::new(172, 32, 0, 1)));
    }

    #[test]
    fn loopback_and_link_local_are_excluded() {
        assert!(!is_eligible(Ipv4Addr::new(127, 0, 0, 1)));
        assert!(!is_eligible(Ipv4Addr::new(169, 254, 0, 1)));
    }

    #[test]
    fn public_addresses_are_excluded() {
        assert!(!is_eligible(Ipv4Addr::new(8, 8, 8, 8)));
    }
}
