use std::net::IpAddr;

use ipnet::IpNet;
use tracing::{info, warn};

use crate::config::settings::GeoConfig;

/// Country resolution for source addresses.
///
/// Resolution itself happens outside this crate; the table only carries the
/// answers an operator already has (address or CIDR -> ISO code).
/// Lookups use longest-prefix match.
pub struct CountryTable {
    /// Sorted by prefix length, longest first.
    networks: Vec<(IpNet, String)>,
}

impl CountryTable {
    pub fn new(config: &GeoConfig) -> Self {
        let mut networks = Vec::with_capacity(config.countries.len());

        for (key, code) in &config.countries {
            let net = match key.parse::<IpNet>() {
                Ok(net) => net,
                Err(_) => match key.parse::<IpAddr>() {
                    Ok(ip) => IpNet::from(ip),
                    Err(e) => {
                        warn!(entry = %key, error = %e, "Skipping invalid country table entry");
                        continue;
                    }
                },
            };
            networks.push((net.trunc(), code.trim().to_uppercase()));
        }

        networks.sort_by(|a, b| b.0.prefix_len().cmp(&a.0.prefix_len()));

        if !networks.is_empty() {
            info!(entries = networks.len(), "Country table loaded");
        }

        Self { networks }
    }

    /// Country code for an address literal; `None` when unresolved or unparsable.
    pub fn lookup_country(&self, address: &str) -> Option<&str> {
        let ip: IpAddr = address.parse().ok()?;
        self.networks
            .iter()
            .find(|(net, _)| net.contains(&ip))
            .map(|(_, code)| code.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
