//! Campus network classification helpers.
//!
//! A caller IP is considered on-campus when it falls inside a configured
//! network (exact CIDR suffix, dotted subnet mask, or the router's /24 when
//! no mask is given) or, failing that, inside one of the globally allowed
//! CIDR ranges from configuration.

use std::net::IpAddr;
use std::str::FromStr;

use ipnet::{IpNet, Ipv4Net};

/// Parses a comma-separated CIDR list, skipping entries that do not parse.
pub fn parse_cidrs(csv: &str) -> Vec<IpNet> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| IpNet::from_str(s).ok())
        .collect()
}

/// Normalizes IPv4-mapped IPv6 addresses (e.g. `::ffff:192.168.1.10`) to IPv4.
pub fn normalize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => ip,
        },
        v4 => v4,
    }
}

/// Returns true if `ip_str` is inside any of the given networks.
///
/// Version-mismatched comparisons never match.
pub fn ip_in_any(ip_str: &str, nets: &[IpNet]) -> bool {
    let Ok(ip) = IpAddr::from_str(ip_str) else {
        return false;
    };
    let ip = normalize_ip(ip);
    nets.iter().any(|net| match (ip, net) {
        (IpAddr::V4(_), IpNet::V4(_)) | (IpAddr::V6(_), IpNet::V6(_)) => net.contains(&ip),
        _ => false,
    })
}

/// Checks a client IP against a single configured network row.
///
/// `subnet_mask` accepts either a CIDR suffix (`/24`) or a dotted mask
/// (`255.255.255.0`). With no mask the router's /24 is assumed.
pub fn network_contains(router_ip: &str, subnet_mask: Option<&str>, client_ip: &str) -> bool {
    let Ok(client) = IpAddr::from_str(client_ip) else {
        return false;
    };
    let client = normalize_ip(client);
    let Ok(router) = IpAddr::from_str(router_ip) else {
        return false;
    };

    let net = match subnet_mask {
        Some(mask) if mask.starts_with('/') => {
            let Ok(prefix) = mask[1..].parse::<u8>() else {
                return false;
            };
            match IpNet::new(router, prefix) {
                Ok(n) => n.trunc(),
                Err(_) => return false,
            }
        }
        Some(mask) => {
            // Dotted mask only makes sense for IPv4.
            let (IpAddr::V4(r4), Ok(IpAddr::V4(m4))) = (router, IpAddr::from_str(mask)) else {
                return false;
            };
            match Ipv4Net::with_netmask(r4, m4) {
                Ok(n) => IpNet::V4(n.trunc()),
                Err(_) => return false,
            }
        }
        None => match IpNet::new(router, 24) {
            Ok(n) => n.trunc(),
            Err(_) => return false,
        },
    };

    match (client, &net) {
        (IpAddr::V4(_), IpNet::V4(_)) | (IpAddr::V6(_), IpNet::V6(_)) => net.contains(&client),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cidr_suffix_match() {
        assert!(network_contains("192.168.1.1", Some("/24"), "192.168.1.42"));
        assert!(!network_contains("192.168.1.1", Some("/24"), "192.168.2.42"));
    }

    #[test]
    fn dotted_mask_match() {
        assert!(network_contains(
            "10.0.0.1",
            Some("255.255.0.0"),
            "10.0.99.7"
        ));
        assert!(!network_contains(
            "10.0.0.1",
            Some("255.255.0.0"),
            "10.1.0.7"
        ));
    }

    #[test]
    fn default_slash_24_when_no_mask() {
        assert!(network_contains("172.16.5.1", None, "172.16.5.200"));
        assert!(!network_contains("172.16.5.1", None, "172.16.6.200"));
    }

    #[test]
    fn ipv4_mapped_ipv6_normalized() {
        assert!(network_contains(
            "192.168.1.1",
            Some("/24"),
            "::ffff:192.168.1.9"
        ));
    }

    #[test]
    fn allowed_cidr_list() {
        let nets = parse_cidrs("192.168.0.0/16, 172.16.0.0/12, bogus");
        assert_eq!(nets.len(), 2);
        assert!(ip_in_any("192.168.44.3", &nets));
        assert!(!ip_in_any("8.8.8.8", &nets));
    }
}
