//! Configuration validation

use super::{Config, IPV6_MIN_MTU};
use crate::protocol::ipv6::HEADER_SIZE as IPV6_HEADER_SIZE;
use crate::protocol::ndp::{rio_prefix_bytes, MTU_OPTION_SIZE, RA_HEADER_SIZE, RIO_HEADER_SIZE};
use crate::protocol::Ipv6Prefix;

/// Upper bound for the router lifetime (RFC 4861 §6.2.1)
const MAX_ROUTER_LIFETIME: u16 = 9000;

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// One `[WARN]`/`[ERROR]` line per finding, warnings first
    pub fn diagnostics(&self) -> Vec<String> {
        let warnings = self.warnings.iter().map(|w| format!("[WARN] {}", w));
        let errors = self.errors.iter().map(|e| format!("[ERROR] {}", e));
        warnings.chain(errors).collect()
    }

    /// Print every finding to stderr regardless of the log filter
    pub fn print_diagnostics(&self) {
        for line in self.diagnostics() {
            eprintln!("{}", line);
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate configuration and return warnings/errors
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_tunnel(config, &mut result);
    validate_router_advertisement(config, &mut result);
    validate_logging(config, &mut result);

    result
}

fn validate_tunnel(config: &Config, result: &mut ValidationResult) {
    let tunnel = &config.tunnel;

    if tunnel.mtu < IPV6_MIN_MTU {
        result.error(format!(
            "tunnel.mtu: {} is below the IPv6 minimum MTU of {}",
            tunnel.mtu, IPV6_MIN_MTU
        ));
    }

    // Size of the advertisement including its IPv6 header
    let mut ra_size = IPV6_HEADER_SIZE + RA_HEADER_SIZE + MTU_OPTION_SIZE;

    match tunnel.network_prefix() {
        Ok(Some(prefix)) => ra_size += rio_size(&prefix),
        Ok(None) => result.error("tunnel.network: required to build router advertisements"),
        Err(e) => result.error(format!("tunnel.network: {}", e)),
    }

    for (i, route) in tunnel.other_routes.iter().enumerate() {
        match route.parse::<Ipv6Prefix>() {
            Ok(prefix) => ra_size += rio_size(&prefix),
            Err(e) => result.error(format!("tunnel.other_routes[{}]: {}", i, e)),
        }
    }

    if ra_size > tunnel.mtu as usize {
        result.error(format!(
            "tunnel.other_routes: router advertisement needs {} bytes, more than mtu {}",
            ra_size, tunnel.mtu
        ));
    }
}

fn rio_size(prefix: &Ipv6Prefix) -> usize {
    RIO_HEADER_SIZE + rio_prefix_bytes(prefix.prefix_len).unwrap_or(16)
}

fn validate_router_advertisement(config: &Config, result: &mut ValidationResult) {
    let ra = &config.router_advertisement;

    if ra.router_lifetime == 0 {
        result.warn("router_advertisement.router_lifetime: 0, peer will not use this router as default");
    } else if ra.router_lifetime > MAX_ROUTER_LIFETIME {
        result.warn(format!(
            "router_advertisement.router_lifetime: {} exceeds the RFC 4861 maximum of {}",
            ra.router_lifetime, MAX_ROUTER_LIFETIME
        ));
    }

    if ra.route_lifetime == 0 {
        result.warn("router_advertisement.route_lifetime: 0 withdraws every advertised route");
    }
}

fn validate_logging(config: &Config, result: &mut ValidationResult) {
    let logging = &config.logging;

    if !["error", "warn", "info", "debug", "trace"].contains(&logging.level.to_lowercase().as_str()) {
        result.warn(format!(
            "logging.level: unknown level '{}', using info",
            logging.level
        ));
    }

    if !["pretty", "compact", "json"].contains(&logging.format.as_str()) {
        result.warn(format!(
            "logging.format: unknown format '{}', using pretty",
            logging.format
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> Config {
        let mut config = Config::default();
        config.tunnel.network = Some("2001:db8::/64".to_string());
        config
    }

    #[test]
    fn test_valid_minimal_config() {
        let config = make_config();
        let result = validate(&config);
        assert!(!result.has_errors());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_network_required() {
        let result = validate(&Config::default());
        assert!(result.has_errors());
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("tunnel.network: required")));
    }

    #[test]
    fn test_invalid_network() {
        let mut config = make_config();
        config.tunnel.network = Some("2001:db8::/200".to_string());
        let result = validate(&config);
        assert!(result.errors.iter().any(|e| e.starts_with("tunnel.network:")));
    }

    #[test]
    fn test_invalid_other_route() {
        let mut config = make_config();
        config.tunnel.other_routes = vec!["2001:db8:1::/48".to_string(), "bogus".to_string()];
        let result = validate(&config);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("tunnel.other_routes[1]"));
    }

    #[test]
    fn test_mtu_below_minimum() {
        let mut config = make_config();
        config.tunnel.mtu = 1000;
        let result = validate(&config);
        assert!(result.errors.iter().any(|e| e.contains("minimum MTU")));
    }

    #[test]
    fn test_routes_exceed_mtu() {
        let mut config = make_config();
        // 40 + 16 + 8 + 16 = 80 bytes before the extra routes, 24 bytes each
        config.tunnel.other_routes = (0..51).map(|i| format!("2001:db8:{:x}::/96", i)).collect();
        let result = validate(&config);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("router advertisement needs 1304 bytes")));
    }

    #[test]
    fn test_router_lifetime_warnings() {
        let mut config = make_config();
        config.router_advertisement.router_lifetime = 0;
        let result = validate(&config);
        assert!(!result.has_errors());
        assert!(result.warnings.iter().any(|w| w.contains("router_lifetime: 0")));

        config.router_advertisement.router_lifetime = 9001;
        let result = validate(&config);
        assert!(result.warnings.iter().any(|w| w.contains("exceeds")));
    }

    #[test]
    fn test_diagnostics_not_filtered_by_log_level() {
        let mut config = make_config();
        config.logging.level = "error".to_string();
        config.router_advertisement.route_lifetime = 0;
        config.tunnel.other_routes = vec!["bogus".to_string()];

        let result = validate(&config);
        let lines = result.diagnostics();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[WARN] router_advertisement.route_lifetime"));
        assert!(lines[1].starts_with("[ERROR] tunnel.other_routes[0]"));
    }

    #[test]
    fn test_logging_warnings() {
        let mut config = make_config();
        config.logging.level = "verbose".to_string();
        config.logging.format = "xml".to_string();
        let result = validate(&config);
        assert_eq!(result.warnings.len(), 2);
    }
}
