//! Offline commands: resolve a device or report ring ownership without
//! starting any listener.

use anyhow::Context;
use corelib::{HashRing, MembershipSnapshot, RingConfig};
use redirect::DeviceId;
use serde::Serialize;

/// Where one device lands.
#[derive(Debug, Serialize)]
pub struct LookupReport {
    /// Canonical device name.
    pub device: String,
    /// Ring token, hex.
    pub token: String,
    /// Owner address.
    pub owner: String,
}

/// Resolve `device` against `members`.
pub fn lookup(
    members: &MembershipSnapshot,
    ring: &RingConfig,
    device: &str,
) -> anyhow::Result<LookupReport> {
    let device = DeviceId::parse(device).context("invalid device name")?.to_string();
    let ring = HashRing::from_snapshot(members, ring);
    let token = ring.token_for(device.as_bytes());
    let owner = ring.owner(token).context("no instances configured")?;

    Ok(LookupReport {
        token: token.to_string(),
        owner: owner.address().to_string(),
        device,
    })
}

/// One node's slice of the ring.
#[derive(Debug, Serialize)]
pub struct NodeShare {
    pub address: String,
    /// Fraction of the ring, between 0 and 1.
    pub share: f64,
}

/// Summary of a ring built from the configured membership.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub hash: String,
    pub vnodes_per_node: usize,
    pub tokens: usize,
    pub nodes: Vec<NodeShare>,
}

/// Build a ring from `members` and report each node's share of it.
pub fn inspect(members: &MembershipSnapshot, ring: &RingConfig) -> InspectReport {
    let built = HashRing::from_snapshot(members, ring);
    InspectReport {
        hash: ring.hash.to_string(),
        vnodes_per_node: built.vnodes_per_node(),
        tokens: built.token_count(),
        nodes: built
            .ownership()
            .into_iter()
            .map(|(id, share)| NodeShare {
                address: id.to_string(),
                share,
            })
            .collect(),
    }
}

impl InspectReport {
    /// Human-readable table.
    pub fn render(&self) -> String {
        let mut out = format!(
            "hash={} vnodes/node={} tokens={}\n",
            self.hash, self.vnodes_per_node, self.tokens
        );
        if self.nodes.is_empty() {
            out.push_str("(no instances)\n");
        }
        for node in &self.nodes {
            out.push_str(&format!("{:>7.3}%  {}\n", node.share * 100.0, node.address));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(addrs: &[&str]) -> MembershipSnapshot {
        MembershipSnapshot::from_addresses(addrs.iter().copied()).unwrap()
    }

    #[test]
    fn test_lookup_normalizes_device_name() {
        let members = members(&["a:80", "b:80", "c:80"]);
        let config = RingConfig::default();

        let upper = lookup(&members, &config, "MAC:AA-BB-CC-DD-EE-FF").unwrap();
        let lower = lookup(&members, &config, "mac:aabbccddeeff").unwrap();
        assert_eq!(upper.device, "mac:aabbccddeeff");
        assert_eq!(upper.owner, lower.owner);
        assert_eq!(upper.token, lower.token);
    }

    #[test]
    fn test_lookup_errors() {
        let config = RingConfig::default();
        assert!(lookup(&members(&["a:80"]), &config, "garbage").is_err());
        assert!(lookup(&MembershipSnapshot::new(), &config, "serial:1").is_err());
    }

    #[test]
    fn test_inspect_shares_sum_to_one() {
        let report = inspect(&members(&["a:80", "b:80", "c:80"]), &RingConfig::default());
        assert_eq!(report.nodes.len(), 3);
        assert_eq!(report.tokens, 3 * 211);
        let total: f64 = report.nodes.iter().map(|n| n.share).sum();
        assert!((total - 1.0).abs() < 1e-9);

        let rendered = report.render();
        assert!(rendered.contains("http://b:80"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["hash"], "xxh3");
        assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_inspect_empty() {
        let report = inspect(&MembershipSnapshot::new(), &RingConfig::default());
        assert!(report.nodes.is_empty());
        assert!(report.render().contains("no instances"));
    }
}
