//! CIDR and single-address matching for the IP allow list.

use std::net::IpAddr;

use ipnet::IpNet;

/// IP address matcher supporting CIDR ranges and single IPs.
#[derive(Debug, Clone, Default)]
pub struct IpMatcher {
    networks: Vec<IpNet>,
    single_ips: Vec<IpAddr>,
}

impl IpMatcher {
    /// Parse a list of IP/CIDR entries. Blank entries are ignored.
    pub fn new(entries: &[String]) -> Result<Self, String> {
        let mut networks = Vec::new();
        let mut single_ips = Vec::new();

        for entry in entries {
            let trimmed = entry.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.contains('/') {
                let net: IpNet = trimmed
                    .parse()
                    .map_err(|e| format!("invalid CIDR '{}': {}", trimmed, e))?;
                networks.push(net);
            } else {
                let ip: IpAddr = trimmed
                    .parse()
                    .map_err(|e| format!("invalid IP address '{}': {}", trimmed, e))?;
                single_ips.push(ip);
            }
        }

        Ok(Self {
            networks,
            single_ips,
        })
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        // IPv4 clients on a dual-stack socket show up as ::ffff:a.b.c.d
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
            v4 => v4,
        };
        self.single_ips.contains(&ip) || self.networks.iter().any(|net| net.contains(&ip))
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty() && self.single_ips.is_empty()
    }
}
