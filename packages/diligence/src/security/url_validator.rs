//! URL validation for SSRF protection.
//!
//! Search results are untrusted input: any URL a provider returns may be
//! handed to the page fetcher. [`UrlValidator`] rejects:
//! - internal services (localhost, loopback)
//! - private and link-local ranges, including cloud metadata endpoints
//! - non-HTTP(S) schemes

use std::collections::HashSet;
use std::net::IpAddr;

use url::{Host, Url};

use crate::error::{SecurityError, SecurityResult};

const DEFAULT_BLOCKED_HOSTS: &[&str] = &[
    "localhost",
    "metadata.google.internal",
    "metadata.gke.internal",
    "instance-data",
];

const DEFAULT_BLOCKED_CIDRS: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

#[derive(Debug, Clone)]
pub struct UrlValidator {
    allowed_schemes: HashSet<String>,
    blocked_hosts: HashSet<String>,
    blocked_cidrs: Vec<ipnet::IpNet>,
    /// Hosts that bypass every other check
    allowed_hosts: HashSet<String>,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlValidator {
    pub fn new() -> Self {
        Self {
            allowed_schemes: ["http", "https"].into_iter().map(String::from).collect(),
            blocked_hosts: DEFAULT_BLOCKED_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            blocked_cidrs: DEFAULT_BLOCKED_CIDRS
                .iter()
                .filter_map(|c| c.parse().ok())
                .collect(),
            allowed_hosts: HashSet::new(),
        }
    }

    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.insert(host.into().to_lowercase());
        self
    }

    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.blocked_hosts.insert(host.into().to_lowercase());
        self
    }

    pub fn block_cidr(mut self, cidr: ipnet::IpNet) -> Self {
        self.blocked_cidrs.push(cidr);
        self
    }

    fn check_ip(&self, ip: IpAddr) -> SecurityResult<()> {
        match self.blocked_cidrs.iter().find(|cidr| cidr.contains(&ip)) {
            Some(_) => Err(SecurityError::BlockedCidr(ip.to_string())),
            None => Ok(()),
        }
    }

    /// Validate scheme, host name and literal IPs without touching DNS.
    pub fn validate(&self, url: &str) -> SecurityResult<()> {
        let parsed = Url::parse(url)?;

        if !self.allowed_schemes.contains(parsed.scheme()) {
            return Err(SecurityError::DisallowedScheme(parsed.scheme().to_string()));
        }

        let host = parsed.host().ok_or(SecurityError::NoHost)?;
        let name = parsed.host_str().unwrap_or_default().to_lowercase();
        if self.allowed_hosts.contains(&name) {
            return Ok(());
        }

        match host {
            Host::Ipv4(ip) => self.check_ip(IpAddr::V4(ip)),
            Host::Ipv6(ip) => self.check_ip(IpAddr::V6(ip)),
            Host::Domain(_) if self.blocked_hosts.contains(&name) => {
                Err(SecurityError::BlockedHost(name))
            }
            Host::Domain(_) => Ok(()),
        }
    }

    /// [`validate`](Self::validate), then resolve the host and check every
    /// address it maps to. Catches names that point at internal IPs.
    pub async fn validate_with_dns(&self, url: &str) -> SecurityResult<()> {
        self.validate(url)?;

        let parsed = Url::parse(url)?;
        let Some(Host::Domain(domain)) = parsed.host() else {
            return Ok(());
        };
        if self.allowed_hosts.contains(&domain.to_lowercase()) {
            return Ok(());
        }

        let port = parsed.port_or_known_default().unwrap_or(80);
        let addrs = tokio::net::lookup_host((domain, port))
            .await
            .map_err(|e| SecurityError::DnsResolution(format!("{}: {}", domain, e)))?;

        for addr in addrs {
            self.check_ip(addr.ip()).map_err(|_| {
                SecurityError::BlockedCidr(format!(
                    "{} resolved to blocked address {}",
                    domain,
                    addr.ip()
                ))
            })?;
        }
        Ok(())
    }
}
