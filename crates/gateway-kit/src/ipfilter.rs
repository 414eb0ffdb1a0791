//! IP allow/deny filtering.
//!
//! Entries are single addresses (`10.0.0.1`) or CIDR networks
//! (`192.168.0.0/16`, `2001:db8::/32`). A matching deny entry always wins,
//! then a matching allow entry admits the client, and everything else gets
//! the default decision (`!block_by_default`).

use std::net::{IpAddr, SocketAddr};

use http::HeaderMap;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::files::{load_filtering, FileError};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Raw filter settings, usually produced from the allow/deny list files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpFilterOptions {
    pub allowed: Vec<String>,
    pub blocked: Vec<String>,
    pub block_by_default: bool,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    pub trust_proxy: bool,
}

#[derive(Debug, Clone)]
pub struct IpFilter {
    allowed: Vec<IpNetwork>,
    blocked: Vec<IpNetwork>,
    block_by_default: bool,
    trust_proxy: bool,
}

impl IpFilter {
    pub fn new(options: IpFilterOptions) -> Self {
        Self {
            allowed: parse_networks(&options.allowed, "allow"),
            blocked: parse_networks(&options.blocked, "deny"),
            block_by_default: options.block_by_default,
            trust_proxy: options.trust_proxy,
        }
    }

    /// Decide whether `ip` may connect.
    pub fn allowed(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        if self.blocked.iter().any(|net| net.contains(ip)) {
            return false;
        }
        if self.allowed.iter().any(|net| net.contains(ip)) {
            return true;
        }
        !self.block_by_default
    }

    pub fn blocked(&self, ip: IpAddr) -> bool {
        !self.allowed(ip)
    }

    pub fn trust_proxy(&self) -> bool {
        self.trust_proxy
    }

    /// Resolve the client address of a request.
    ///
    /// Proxy headers are only consulted when `trust_proxy` is set; otherwise
    /// the transport peer address is used.
    pub fn client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
        if self.trust_proxy {
            let forwarded = headers
                .get(X_FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(parse_addr);
            if forwarded.is_some() {
                return forwarded;
            }
            let real_ip = headers
                .get(X_REAL_IP)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_addr);
            if real_ip.is_some() {
                return real_ip;
            }
        }
        peer.map(|addr| addr.ip())
    }

    /// Decide for a request. Clients whose address cannot be determined get
    /// the default decision.
    pub fn allows_request(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> bool {
        match self.client_ip(headers, peer) {
            Some(ip) => self.allowed(ip),
            None => !self.block_by_default,
        }
    }
}

fn parse_addr(value: &str) -> Option<IpAddr> {
    let value = value.trim();
    value
        .parse::<IpAddr>()
        .ok()
        .or_else(|| value.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

fn parse_networks(entries: &[String], list: &str) -> Vec<IpNetwork> {
    entries
        .iter()
        .filter_map(|entry| match entry.trim().parse::<IpNetwork>() {
            Ok(net) => Some(net),
            Err(e) => {
                tracing::warn!(list, entry = %entry, error = %e, "Ignoring invalid IP filter entry");
                None
            }
        })
        .collect()
}

/// IP filter settings as they appear in service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpFilterConfig {
    pub allow_list_path: String,
    pub deny_list_path: String,
    pub block_by_default: bool,
    pub trust_proxy: bool,
}

impl IpFilterConfig {
    /// Load the list files and build a filter.
    ///
    /// Returns `None` when neither list has entries, in which case no
    /// filtering should be installed.
    pub fn load(&self) -> Result<Option<IpFilter>, FileError> {
        let (allowed, blocked) = load_filtering(&self.allow_list_path, &self.deny_list_path)?;
        if allowed.is_empty() && blocked.is_empty() {
            return Ok(None);
        }
        tracing::debug!(
            allowed = ?allowed,
            denied = ?blocked,
            block_by_default = self.block_by_default,
            trust_proxy = self.trust_proxy,
            "Filtering requests by IP"
        );
        Ok(Some(IpFilter::new(IpFilterOptions {
            allowed,
            blocked,
            block_by_default: self.block_by_default,
            trust_proxy: self.trust_proxy,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn filter(allowed: &[&str], blocked: &[&str], block_by_default: bool) -> IpFilter {
        IpFilter::new(IpFilterOptions {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            blocked: blocked.iter().map(|s| s.to_string()).collect(),
            block_by_default,
            trust_proxy: false,
        })
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn deny_list_blocks_listed_addresses() {
        let f = filter(&[], &["10.0.0.2", "172.16.0.0/12"], false);
        assert!(f.blocked(ip("10.0.0.2")));
        assert!(f.blocked(ip("172.20.1.1")));
        assert!(f.allowed(ip("10.0.0.3")));
    }

    #[test]
    fn allow_list_with_block_by_default() {
        let f = filter(&["10.0.0.0/24", "2001:db8::/32"], &[], true);
        assert!(f.allowed(ip("10.0.0.77")));
        assert!(f.allowed(ip("2001:db8::1")));
        assert!(f.blocked(ip("10.0.1.1")));
    }

    #[test]
    fn deny_entry_overrides_allow_entry() {
        let f = filter(&["10.0.0.0/8"], &["10.1.2.3"], true);
        assert!(f.blocked(ip("10.1.2.3")));
        assert!(f.allowed(ip("10.1.2.4")));
    }

    #[test]
    fn ipv4_mapped_peers_match_ipv4_rules() {
        let f = filter(&[], &["192.168.1.10"], false);
        assert!(f.blocked(ip("::ffff:192.168.1.10")));
    }

    #[test]
    fn invalid_entries_are_skipped() {
        let f = filter(&["not-an-ip", "10.0.0.1"], &[], true);
        assert!(f.allowed(ip("10.0.0.1")));
        assert!(f.blocked(ip("10.0.0.2")));
    }

    #[test]
    fn proxy_headers_ignored_unless_trusted() {
        let f = filter(&[], &["203.0.113.9"], false);
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.9"));
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();

        assert_eq!(f.client_ip(&headers, Some(peer)), Some(ip("10.0.0.1")));
        assert!(f.allows_request(&headers, Some(peer)));
    }

    #[test]
    fn trusted_proxy_uses_first_forwarded_address() {
        let f = IpFilter::new(IpFilterOptions {
            blocked: vec!["203.0.113.9".to_string()],
            trust_proxy: true,
            ..Default::default()
        });
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();

        assert_eq!(f.client_ip(&headers, Some(peer)), Some(ip("203.0.113.9")));
        assert!(!f.allows_request(&headers, Some(peer)));
    }

    #[test]
    fn trusted_proxy_falls_back_to_real_ip_then_peer() {
        let f = IpFilter::new(IpFilterOptions {
            trust_proxy: true,
            ..Default::default()
        });
        let mut headers = HeaderMap::new();
        headers.insert(X_REAL_IP, HeaderValue::from_static("198.51.100.4"));
        assert_eq!(f.client_ip(&headers, None), Some(ip("198.51.100.4")));

        let peer: SocketAddr = "[::1]:4000".parse().unwrap();
        assert_eq!(f.client_ip(&HeaderMap::new(), Some(peer)), Some(ip("::1")));
    }

    #[test]
    fn unknown_client_gets_default_decision() {
        assert!(filter(&[], &["10.0.0.1"], false).allows_request(&HeaderMap::new(), None));
        assert!(!filter(&["10.0.0.1"], &[], true).allows_request(&HeaderMap::new(), None));
    }

    #[test]
    fn config_without_lists_disables_filtering() {
        assert!(IpFilterConfig::default().load().unwrap().is_none());
    }

    #[test]
    fn config_loads_lists_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let deny = dir.path().join("deny.txt");
        std::fs::write(&deny, "# abusive clients\n10.9.9.9\n").unwrap();

        let config = IpFilterConfig {
            deny_list_path: deny.to_string_lossy().into_owned(),
            ..Default::default()
        };
        let filter = config.load().unwrap().unwrap();
        assert!(filter.blocked(ip("10.9.9.9")));
        assert!(filter.allowed(ip("10.9.9.8")));
    }
}
