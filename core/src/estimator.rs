//! Total-work estimate for the progress display.
//!
//! Counts usable hosts with the same policy the workers enumerate with, so a
//! clean run finishes exactly at the estimate. Rows that fail validation, and
//! IPv6 rows, count as zero.

use expandr_common::dataset::NetworkRecord;
use expandr_common::network::cidr;

pub fn estimate_total(records: &[NetworkRecord]) -> u64 {
    records
        .iter()
        .filter_map(|record| cidr::validate_cidr(&record.cidr))
        .map(|network| network.usable_host_count())
        .sum()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(cidrs: &[&str]) -> Vec<NetworkRecord> {
        cidrs.iter().map(|c| NetworkRecord::new(*c, "100")).collect()
    }

    #[test]
    fn invalid_rows_contribute_nothing() {
        assert_eq!(estimate_total(&rows(&["192.168.1.0/30", "not-a-cidr"])), 2);
    }

    #[test]
    fn sums_usable_hosts() {
        let records = rows(&["10.0.0.0/24", "10.0.1.0/31", "10.0.2.5/32", "2001:db8::/64"]);
        assert_eq!(estimate_total(&records), 254 + 2 + 1);
    }

    #[test]
    fn empty_dataset_estimates_zero() {
        assert_eq!(estimate_total(&[]), 0);
    }
}
