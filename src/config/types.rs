//! Configuration types

use crate::protocol::{Ipv6Prefix, RaPolicy};
use crate::telemetry::LogConfig;
use crate::Result;
use serde::Deserialize;
use std::net::Ipv6Addr;

/// Minimum link MTU for IPv6 (RFC 8200 §5)
pub const IPV6_MIN_MTU: u32 = 1280;

/// User-defined configuration (config.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tunnel: TunnelConfig,
    #[serde(default)]
    pub router_advertisement: RouterAdvertisementConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// MTU advertised to the peer
    pub mtu: u32,
    /// The tunnel's own allocated route, `address/prefixlen`
    pub network: Option<String>,
    /// Additional routes advertised with low preference
    pub other_routes: Vec<String>,
    /// Source address of advertisements
    pub local_address: Ipv6Addr,
    /// Destination address of unsolicited advertisements
    pub peer_address: Ipv6Addr,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            mtu: IPV6_MIN_MTU,
            network: None,
            other_routes: Vec::new(),
            local_address: Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1),
            peer_address: Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1),
        }
    }
}

impl TunnelConfig {
    /// Parsed `network`, if configured
    pub fn network_prefix(&self) -> Result<Option<Ipv6Prefix>> {
        self.network.as_deref().map(str::parse::<Ipv6Prefix>).transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterAdvertisementConfig {
    pub cur_hop_limit: u8,
    pub managed: bool,
    pub other: bool,
    /// Seconds
    pub router_lifetime: u16,
    /// Milliseconds
    pub reachable_time: u32,
    /// Milliseconds
    pub retrans_timer: u32,
    /// Seconds, applied to every Route Information option
    pub route_lifetime: u32,
}

impl Default for RouterAdvertisementConfig {
    fn default() -> Self {
        let policy = RaPolicy::default();
        Self {
            cur_hop_limit: policy.cur_hop_limit,
            managed: policy.managed,
            other: policy.other,
            router_lifetime: policy.router_lifetime,
            reachable_time: policy.reachable_time,
            retrans_timer: policy.retrans_timer,
            route_lifetime: policy.route_lifetime,
        }
    }
}

impl Config {
    /// Router policy for the engine
    pub fn ra_policy(&self) -> RaPolicy {
        let ra = &self.router_advertisement;
        RaPolicy {
            cur_hop_limit: ra.cur_hop_limit,
            managed: ra.managed,
            other: ra.other,
            router_lifetime: ra.router_lifetime,
            reachable_time: ra.reachable_time,
            retrans_timer: ra.retrans_timer,
            mtu: self.tunnel.mtu,
            route_lifetime: ra.route_lifetime,
        }
    }
}
