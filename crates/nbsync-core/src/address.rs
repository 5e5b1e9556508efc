// ── Address + mask → CIDR ──

use std::net::Ipv4Addr;

use ipnetwork::{Ipv4Network, ipv4_mask_to_prefix};

/// Combine an IPv4 address and a mask into CIDR notation.
///
/// The mask may be dotted (`255.255.255.0`, contiguous bits only) or a
/// prefix length (`24`, optionally written `/24`). Any unparsable part
/// yields `None`.
pub fn cidr(address: &str, mask: &str) -> Option<String> {
    let address: Ipv4Addr = address.trim().parse().ok()?;
    let network = Ipv4Network::new(address, prefix_len(mask.trim())?).ok()?;
    Some(network.to_string())
}

fn prefix_len(mask: &str) -> Option<u8> {
    let mask = mask.strip_prefix('/').unwrap_or(mask);
    if let Ok(length) = mask.parse::<u8>() {
        return Some(length);
    }
    ipv4_mask_to_prefix(mask.parse().ok()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_masks() {
        assert_eq!(cidr("10.0.0.1", "255.255.255.0").as_deref(), Some("10.0.0.1/24"));
        assert_eq!(cidr("10.1.1.1", "255.255.255.255").as_deref(), Some("10.1.1.1/32"));
        assert_eq!(cidr("192.0.2.9", "255.255.255.252").as_deref(), Some("192.0.2.9/30"));
        assert_eq!(cidr("0.0.0.0", "0.0.0.0").as_deref(), Some("0.0.0.0/0"));
    }

    #[test]
    fn prefix_length_masks() {
        assert_eq!(cidr("10.0.0.1", "24").as_deref(), Some("10.0.0.1/24"));
        assert_eq!(cidr(" 10.0.0.1 ", "/32").as_deref(), Some("10.0.0.1/32"));
    }

    #[test]
    fn invalid_inputs_yield_nothing() {
        assert_eq!(cidr("10.0.0.300", "24"), None);
        assert_eq!(cidr("not-an-ip", "255.255.255.0"), None);
        assert_eq!(cidr("10.0.0.1", "33"), None);
        assert_eq!(cidr("10.0.0.1", "255.0.255.0"), None);
        assert_eq!(cidr("10.0.0.1", ""), None);
        assert_eq!(cidr("10.0.0.1", "300"), None);
    }
}
