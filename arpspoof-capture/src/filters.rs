//! BPF (Berkeley Packet Filter) expressions for the relay capture

/// ARP filter
/// Captures all ARP packets
pub fn arp_filter() -> String {
    "arp".to_string()
}

/// IPv4 filter
pub fn ipv4_filter() -> String {
    "ip".to_string()
}

/// Filter for specific source MAC address
pub fn src_mac_filter(mac: &str) -> String {
    format!("ether src {}", mac)
}

/// Combine multiple filters with OR logic
pub fn combine_filters_or(filters: &[&str]) -> String {
    if filters.is_empty() {
        return String::new();
    }

    filters
        .iter()
        .map(|f| format!("({})", f))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Negate a filter
pub fn not_filter(filter: &str) -> String {
    format!("not ({})", filter)
}

/// Everything the engine inspects: ARP for resolution and re-spoof
/// triggers, IPv4 for the relay
pub fn relay_filter() -> String {
    combine_filters_or(&[&arp_filter(), &ipv4_filter()])
}

/// [`relay_filter`] minus frames we injected ourselves
pub fn relay_filter_excluding(local_mac: &str) -> String {
    format!(
        "({}) and {}",
        relay_filter(),
        not_filter(&src_mac_filter(local_mac))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_filter() {
        assert_eq!(relay_filter(), "(arp) or (ip)");
    }

    #[test]
    fn test_relay_filter_excluding() {
        assert_eq!(
            relay_filter_excluding("11:11:11:11:11:11"),
            "((arp) or (ip)) and not (ether src 11:11:11:11:11:11)"
        );
    }

    #[test]
    fn test_combine_empty() {
        assert_eq!(combine_filters_or(&[]), "");
    }
}
