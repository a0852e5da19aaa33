//! # Network Validator
//!
//! Parses dataset CIDR strings and decides which addresses of a block count
//! as usable hosts.
//!
//! Parsing is permissive about stray host bits: `192.168.1.77/24` is accepted
//! and normalised to `192.168.1.0/24`. A bare address parses as a single-host
//! network. Invalid input never raises, it simply yields `None` so callers can
//! treat it as a skip condition.
//!
//! ## Usable-host policy
//! * `/32`: the single address.
//! * `/31`: both addresses (point-to-point link, RFC 3021).
//! * anything larger: every address except the network base and broadcast.
//!
//! IPv6 networks are valid but have no dotted-quad hosts.

use std::fmt;
use std::net::IpAddr;

use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};

use crate::network::range::Ipv4Range;

/// A successfully parsed, normalised network block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkDescriptor {
    network: IpNetwork,
}

impl NetworkDescriptor {
    pub fn network(&self) -> IpNetwork {
        self.network
    }

    pub fn base_addr(&self) -> IpAddr {
        self.network.network()
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    pub fn is_ipv4(&self) -> bool {
        self.network.is_ipv4()
    }

    /// Raw number of addresses covered by the block, saturating for a v6 `/0`.
    pub fn capacity(&self) -> u128 {
        let host_bits: u32 = match self.network {
            IpNetwork::V4(_) => 32 - u32::from(self.prefix()),
            IpNetwork::V6(_) => 128 - u32::from(self.prefix()),
        };
        1u128.checked_shl(host_bits).unwrap_or(u128::MAX)
    }

    /// The usable hosts of an IPv4 block, or `None` for IPv6.
    pub fn usable_hosts(&self) -> Option<Ipv4Range> {
        let IpNetwork::V4(v4) = self.network else {
            return None;
        };

        let base: u32 = u32::from(v4.network());
        let broadcast: u32 = u32::from(v4.broadcast());

        let range = match v4.prefix() {
            31 | 32 => Ipv4Range::new(base.into(), broadcast.into()),
            _ => Ipv4Range::new((base + 1).into(), (broadcast - 1).into()),
        };
        Some(range)
    }

    /// Count of addresses [`Self::usable_hosts`] yields. Zero for IPv6.
    pub fn usable_host_count(&self) -> u64 {
        self.usable_hosts().map_or(0, |range| range.len())
    }
}

impl fmt::Display for NetworkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network.network(), self.network.prefix())
    }
}

/// Parses `cidr` into a normalised network, or `None` if it is not a network.
pub fn validate_cidr(cidr: &str) -> Option<NetworkDescriptor> {
    let parsed: IpNetwork = cidr.trim().parse().ok()?;

    let network = match parsed {
        IpNetwork::V4(v4) => IpNetwork::V4(Ipv4Network::new(v4.network(), v4.prefix()).ok()?),
        IpNetwork::V6(v6) => IpNetwork::V6(Ipv6Network::new(v6.network(), v6.prefix()).ok()?),
    };

    Some(NetworkDescriptor { network })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
