//! Process-wide DNS resolution cache (spec section 4.2 / 5).
//!
//! Maps hostnames to the IP address of the most recent successful
//! connection. Last-writer-wins, which the spec explicitly accepts
//! (section 5, "Shared resources").

use std::net::IpAddr;

use dashmap::DashMap;

#[derive(Default)]
pub struct DnsCache {
    entries: DashMap<String, IpAddr>,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, host: &str) -> Option<IpAddr> {
        self.entries.get(host).map(|v| *v)
    }

    pub fn set(&self, host: impl Into<String>, ip: IpAddr) {
        self.entries.insert(host.into(), ip);
    }
}
