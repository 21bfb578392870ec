//! CIDR aggregation for zone files.
//!
//! Networks are converted to inclusive integer ranges, merged, and then
//! re-expanded into the fewest aligned CIDR blocks covering the same space.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::cmp::Reverse;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Inclusive address range in the family's integer space.
type Interval = (u128, u128);

/// Aggregate a list of IPs/CIDRs into optimized CIDR ranges.
///
/// IPv4 and IPv6 are aggregated separately; the result lists the IPv4
/// blocks first, each family in ascending address order.
/// For example: [192.168.0.0/25, 192.168.0.128/25] -> [192.168.0.0/24]
pub fn aggregate(nets: &[IpNet]) -> Vec<IpNet> {
    let mut v4_nets = Vec::new();
    let mut v6_nets = Vec::new();
    for net in nets {
        match net {
            IpNet::V4(v4) => v4_nets.push(*v4),
            IpNet::V6(v6) => v6_nets.push(*v6),
        }
    }

    aggregate_v4(&v4_nets)
        .into_iter()
        .map(IpNet::V4)
        .chain(aggregate_v6(&v6_nets).into_iter().map(IpNet::V6))
        .collect()
}

/// Aggregate IPv4 networks.
pub fn aggregate_v4(nets: &[Ipv4Net]) -> Vec<Ipv4Net> {
    let intervals = nets
        .iter()
        .map(|n| {
            (
                u32::from(n.network()) as u128,
                u32::from(n.broadcast()) as u128,
            )
        })
        .collect();

    merge_intervals(intervals)
        .into_iter()
        .flat_map(|(start, end)| range_to_blocks(start, end, 32))
        .filter_map(|(addr, prefix)| Ipv4Net::new(Ipv4Addr::from(addr as u32), prefix).ok())
        .collect()
}

/// Aggregate IPv6 networks.
pub fn aggregate_v6(nets: &[Ipv6Net]) -> Vec<Ipv6Net> {
    let intervals = nets
        .iter()
        .map(|n| (u128::from(n.network()), u128::from(n.broadcast())))
        .collect();

    merge_intervals(intervals)
        .into_iter()
        .flat_map(|(start, end)| range_to_blocks(start, end, 128))
        .filter_map(|(addr, prefix)| Ipv6Net::new(Ipv6Addr::from(addr), prefix).ok())
        .collect()
}

/// Sort and fold overlapping or touching intervals together.
fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    // Supersets sort ahead of the ranges they contain
    intervals.sort_unstable_by_key(|&(start, end)| (start, Reverse(end)));

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => {
                if end > last.1 {
                    last.1 = end;
                }
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Split an inclusive range into the minimal list of aligned blocks.
///
/// Returns `(base address, prefix length)` pairs in ascending order.
fn range_to_blocks(mut start: u128, end: u128, bits: u32) -> Vec<(u128, u8)> {
    let mut blocks = Vec::new();
    loop {
        // Largest block the base address is aligned to
        let align = start.trailing_zeros().min(bits);
        // Largest block that still fits before `end`
        let span = end - start;
        let fit = if span == u128::MAX {
            128
        } else {
            127 - (span + 1).leading_zeros()
        };
        let host_bits = align.min(fit);

        blocks.push((start, (bits - host_bits) as u8));

        let last = if host_bits >= 128 {
            u128::MAX
        } else {
            start + ((1u128 << host_bits) - 1)
        };
        if last >= end {
            break;
        }
        start = last + 1;
    }
    blocks
}

/// Calculate the total number of individual IPs covered by a list of CIDRs.
///
/// Uses saturating arithmetic to prevent overflow on large prefixes like /0.
pub fn count_ips(nets: &[IpNet]) -> u128 {
    nets.iter()
        .map(|net| {
            let shift = net.max_prefix_len() - net.prefix_len();
            // 1 << 128 would overflow u128
            if shift >= 128 {
                u128::MAX
            } else {
                1u128 << shift
            }
        })
        .fold(0u128, |acc, count| acc.saturating_add(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nets(list: &[&str]) -> Vec<IpNet> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_aggregate_adjacent_pair() {
        let aggregated = aggregate(&nets(&["10.0.0.0/24", "10.0.1.0/24"]));
        assert_eq!(aggregated, nets(&["10.0.0.0/23"]));
    }

    #[test]
    fn test_aggregate_non_adjacent() {
        let input = nets(&["10.0.0.0/24", "10.0.2.0/24"]);
        assert_eq!(aggregate(&input), input);
    }

    #[test]
    fn test_aggregate_contained() {
        let aggregated = aggregate(&nets(&["192.168.1.0/24", "192.168.1.128/25"]));
        assert_eq!(aggregated, nets(&["192.168.1.0/24"]));
    }

    #[test]
    fn test_aggregate_unaligned_neighbours_stay_split() {
        // Adjacent but 10.0.1.0/24 + 10.0.2.0/24 is not a /23
        let aggregated = aggregate(&nets(&["10.0.1.0/24", "10.0.2.0/24"]));
        assert_eq!(aggregated, nets(&["10.0.1.0/24", "10.0.2.0/24"]));
    }

    #[test]
    fn test_aggregate_range_split_into_blocks() {
        // 10.0.0.0 - 10.0.2.255 covers a /23 and a /24
        let aggregated = aggregate(&nets(&["10.0.0.0/24", "10.0.2.0/24", "10.0.1.0/24"]));
        assert_eq!(aggregated, nets(&["10.0.0.0/23", "10.0.2.0/24"]));
    }

    #[test]
    fn test_aggregate_duplicates() {
        let aggregated = aggregate(&nets(&["8.8.8.0/24", "8.8.8.0/24", "8.8.8.0/24"]));
        assert_eq!(aggregated, nets(&["8.8.8.0/24"]));
    }

    #[test]
    fn test_aggregate_single_address() {
        let aggregated = aggregate(&nets(&["1.2.3.4/32", "2001:db8::1/128"]));
        assert_eq!(aggregated, nets(&["1.2.3.4/32", "2001:db8::1/128"]));
    }

    #[test]
    fn test_aggregate_host_bits_ignored() {
        // 10.0.0.77/24 denotes 10.0.0.0/24
        let aggregated = aggregate(&nets(&["10.0.0.77/24", "10.0.1.0/24"]));
        assert_eq!(aggregated, nets(&["10.0.0.0/23"]));
    }

    #[test]
    fn test_aggregate_whole_spaces() {
        let aggregated = aggregate(&nets(&["0.0.0.0/1", "128.0.0.0/1", "::/1", "8000::/1"]));
        assert_eq!(aggregated, nets(&["0.0.0.0/0", "::/0"]));
    }

    #[test]
    fn test_aggregate_top_of_space() {
        let aggregated = aggregate(&nets(&["255.255.255.255/32", "255.255.255.254/32"]));
        assert_eq!(aggregated, nets(&["255.255.255.254/31"]));

        let aggregated = aggregate(&nets(&["ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff/128", "::/0"]));
        assert_eq!(aggregated, nets(&["::/0"]));
    }

    #[test]
    fn test_aggregate_ipv6() {
        let aggregated = aggregate(&nets(&[
            "2400:da00::/33",
            "2400:da00:8000::/33",
            "2400:da02::/32",
        ]));
        assert_eq!(aggregated, nets(&["2400:da00::/32", "2400:da02::/32"]));
    }

    #[test]
    fn test_aggregate_families_kept_apart() {
        let aggregated = aggregate(&nets(&["::/96", "0.0.0.0/0"]));
        assert_eq!(aggregated, nets(&["0.0.0.0/0", "::/96"]));
    }

    #[test]
    fn test_aggregate_sorted_output() {
        let aggregated = aggregate(&nets(&["192.0.2.0/24", "2001:db8::/32", "10.0.0.0/8"]));
        assert_eq!(
            aggregated,
            nets(&["10.0.0.0/8", "192.0.2.0/24", "2001:db8::/32"])
        );
    }

    #[test]
    fn test_aggregate_empty() {
        let aggregated = aggregate(&[]);
        assert!(aggregated.is_empty());
    }

    #[test]
    fn test_range_to_blocks_unaligned_range() {
        // 10.0.0.1 - 10.0.0.6
        let base = u32::from(Ipv4Addr::new(10, 0, 0, 0)) as u128;
        let blocks = range_to_blocks(base + 1, base + 6, 32);
        assert_eq!(
            blocks,
            vec![(base + 1, 32), (base + 2, 31), (base + 4, 31), (base + 6, 32)]
        );
    }

    #[test]
    fn test_merge_intervals_touching() {
        let merged = merge_intervals(vec![(10, 20), (0, 9), (21, 21), (30, 40), (35, 36)]);
        assert_eq!(merged, vec![(0, 21), (30, 40)]);
    }

    #[test]
    fn test_count_ips() {
        let nets = nets(&["192.168.0.0/24", "10.0.0.0/8"]);
        assert_eq!(count_ips(&nets), 256 + 16_777_216);
    }

    #[test]
    fn test_count_ips_overflow_protection() {
        assert_eq!(count_ips(&nets(&["0.0.0.0/0"])), 1u128 << 32);
        assert_eq!(count_ips(&nets(&["::/0"])), u128::MAX);
        assert_eq!(count_ips(&nets(&["::/0", "::/1"])), u128::MAX);
    }
}
