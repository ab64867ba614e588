use clap::{Parser, Subcommand};
use ndtun::config::{self, Config};
use ndtun::protocol::ipv6;
use ndtun::protocol::{
    build_echo_request, build_router_advertisement, echo_request_to_reply,
    parse_router_solicitation, Icmpv6Packet, Icmpv6Type, Ipv6Header,
};
use ndtun::telemetry::init_logging;
use ndtun::{Error, PacketBuffer};
use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ndtun")]
#[command(about = "ICMPv6 Neighbor Discovery and Echo for point-to-point tunnels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Build the configured Router Advertisement and print it as hex
    Ra {
        /// Path to config.toml
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Build an Echo Request and print it as hex
    Echo {
        #[arg(long)]
        src: Ipv6Addr,
        #[arg(long)]
        dst: Ipv6Addr,
        /// Echo identifier
        #[arg(long, default_value_t = 0)]
        id: u16,
        /// Echo sequence number
        #[arg(long, default_value_t = 0)]
        seq: u16,
        /// Payload as hex
        #[arg(long, default_value = "")]
        payload: String,
    },
    /// Answer an ICMPv6 message (hex) received from `src` addressed to `dst`
    Reply {
        #[arg(long)]
        src: Ipv6Addr,
        #[arg(long)]
        dst: Ipv6Addr,
        /// Path to config.toml, needed to answer Router Solicitations
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// ICMPv6 message as hex
        message: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate config.toml
    Validate {
        /// Path to config.toml
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config {
            action: ConfigAction::Validate { config },
        } => cmd_config_validate(&config),
        Commands::Ra { config } => cmd_ra(&config),
        Commands::Echo {
            src,
            dst,
            id,
            seq,
            payload,
        } => cmd_echo(src, dst, id, seq, &payload),
        Commands::Reply {
            src,
            dst,
            config,
            message,
        } => cmd_reply(src, dst, config.as_deref(), &message),
    };

    if let Err(e) = result {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

/// Load config.toml and bring up logging from its `[logging]` table
fn load_config(path: &Path) -> Result<Config, String> {
    let cfg = config::load(path)
        .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;
    init_logging(Some(&cfg.logging));
    debug!("Loaded {}", path.display());
    Ok(cfg)
}

/// Print validation diagnostics and fail if any of them is an error
fn check_config(cfg: &Config) -> Result<(), String> {
    let validation = config::validate(cfg);
    validation.print_diagnostics();

    if validation.has_errors() {
        Err("Validation failed".to_string())
    } else {
        Ok(())
    }
}

/// Load config.toml for commands that emit packets built from it
fn load_checked_config(path: &Path) -> Result<Config, String> {
    let cfg = load_config(path)?;
    check_config(&cfg)?;
    Ok(cfg)
}

fn cmd_config_validate(config_path: &Path) -> Result<(), String> {
    let cfg = load_config(config_path)?;
    check_config(&cfg)?;

    info!("Configuration is valid");
    Ok(())
}

/// Build the configured RA from `src` to `dst` into a fresh MTU-sized buffer.
///
/// The buffer never exceeds the largest non-jumbo IPv6 packet, whatever
/// MTU is advertised.
fn render_ra(cfg: &Config, src: &Ipv6Addr, dst: &Ipv6Addr) -> Result<Vec<u8>, Error> {
    let network = cfg
        .tunnel
        .network_prefix()?
        .ok_or_else(|| Error::Config("tunnel.network is not set".into()))?;

    let mut storage = vec![0u8; (cfg.tunnel.mtu as usize).min(ipv6::MAX_PACKET_SIZE)];
    let mut buf = PacketBuffer::new(&mut storage, ipv6::HEADER_SIZE)?;
    let ra = build_router_advertisement(
        &mut buf,
        &cfg.ra_policy(),
        src,
        dst,
        &network.network(),
        network.prefix_len,
        &cfg.tunnel.other_routes,
    )?;

    debug!(
        src = %src,
        dst = %dst,
        length = ra.length,
        checksum = ra.checksum,
        routes = cfg.tunnel.other_routes.len() + 1,
        "Built Router Advertisement"
    );
    Ok(buf.data().to_vec())
}

/// Source of an RA answering a solicitation addressed to `solicited`
fn ra_source(cfg: &Config, solicited: Ipv6Addr) -> Ipv6Addr {
    // Multicast is never a valid source; answer from our own address
    if solicited.is_multicast() {
        cfg.tunnel.local_address
    } else {
        solicited
    }
}

fn cmd_ra(config_path: &Path) -> Result<(), String> {
    let cfg = load_checked_config(config_path)?;

    let packet = render_ra(&cfg, &cfg.tunnel.local_address, &cfg.tunnel.peer_address)
        .map_err(|e| format!("Failed to build router advertisement: {}", e))?;

    println!("{}", hex::encode(packet));
    Ok(())
}

fn cmd_echo(src: Ipv6Addr, dst: Ipv6Addr, id: u16, seq: u16, payload: &str) -> Result<(), String> {
    init_logging(None);

    let payload = hex::decode(payload).map_err(|e| format!("Invalid payload hex: {}", e))?;

    let mut storage = vec![0u8; ipv6::HEADER_SIZE + 8 + payload.len()];
    let mut buf =
        PacketBuffer::new(&mut storage, ipv6::HEADER_SIZE).map_err(|e| e.to_string())?;
    let echo = build_echo_request(&mut buf, &src, &dst, id, seq, &payload)
        .map_err(|e| format!("Failed to build echo request: {}", e))?;

    debug!(
        id = echo.identifier,
        seq = echo.sequence,
        bytes = echo.payload_len,
        "Built Echo Request"
    );
    println!("{}", hex::encode(buf.data()));
    Ok(())
}

fn cmd_reply(
    src: Ipv6Addr,
    dst: Ipv6Addr,
    config_path: Option<&Path>,
    message: &str,
) -> Result<(), String> {
    let cfg = match config_path {
        Some(path) => Some(load_checked_config(path)?),
        None => {
            init_logging(None);
            None
        }
    };

    let mut storage = hex::decode(message.trim()).map_err(|e| format!("Invalid hex: {}", e))?;
    let mut buf = PacketBuffer::from_packet(&mut storage);
    let ip_header = Ipv6Header::new(src, dst);

    let msg_type = Icmpv6Packet::parse(buf.data())
        .map_err(|e| e.to_string())?
        .message_type();

    match msg_type {
        Some(Icmpv6Type::EchoRequest) => {
            let reply = echo_request_to_reply(&mut buf, &ip_header).map_err(|e| e.to_string())?;
            info!(
                peer = %src,
                id = reply.identifier,
                seq = reply.sequence,
                "Answering Echo Request"
            );
            println!("{}", hex::encode(buf.data()));
        }
        Some(Icmpv6Type::RouterSolicitation) => {
            let rs = parse_router_solicitation(&mut buf, &ip_header).map_err(|e| e.to_string())?;
            let cfg = cfg.ok_or("A config file (-c) is required to answer Router Solicitations")?;

            let reply_to = rs.reply_destination();
            let reply_from = ra_source(&cfg, dst);
            info!(peer = %rs.source, to = %reply_to, "Answering Router Solicitation");

            let packet = render_ra(&cfg, &reply_from, &reply_to)
                .map_err(|e| format!("Failed to build router advertisement: {}", e))?;
            println!("{}", hex::encode(packet));
        }
        _ => {
            return Err(format!(
                "No answer for ICMPv6 type {}",
                buf.data().first().copied().unwrap_or_default()
            ))
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndtun::protocol::ndp::RA_HEADER_SIZE;
    use ndtun::protocol::{MtuOption, NdOption, NdOptions};

    fn addr(s: &str) -> Ipv6Addr {
        s.parse().unwrap()
    }

    #[test]
    fn test_check_config_rejects_invalid_mtu() {
        let cfg = config::parse("[tunnel]\nmtu = 100\nnetwork = \"2001:db8::/64\"").unwrap();
        assert!(check_config(&cfg).is_err());
    }

    #[test]
    fn test_check_config_accepts_valid() {
        let cfg = config::parse("[tunnel]\nnetwork = \"2001:db8::/64\"").unwrap();
        assert!(check_config(&cfg).is_ok());
    }

    #[test]
    fn test_render_ra_huge_mtu_is_capped() {
        let cfg = config::parse(
            "[tunnel]\nmtu = 4294967295\nnetwork = \"2001:db8::/64\"",
        )
        .unwrap();
        let packet = render_ra(&cfg, &addr("fe80::1"), &addr("ff02::1")).unwrap();

        assert_eq!(packet.len(), RA_HEADER_SIZE + 8 + 16);
        assert_eq!(
            MtuOption::decode(&packet[RA_HEADER_SIZE..]).unwrap().mtu,
            u32::MAX
        );
    }

    #[test]
    fn test_render_ra_advertises_network_address() {
        let cfg = config::parse("[tunnel]\nnetwork = \"2001:db8::1/64\"").unwrap();
        let packet = render_ra(&cfg, &addr("fe80::1"), &addr("ff02::1")).unwrap();

        let routes: Vec<_> = NdOptions::new(&packet[RA_HEADER_SIZE..])
            .filter_map(|option| match option.unwrap() {
                NdOption::RouteInfo(rio) => Some(rio.prefix),
                _ => None,
            })
            .collect();
        assert_eq!(routes, vec![addr("2001:db8::")]);
    }

    #[test]
    fn test_render_ra_requires_network() {
        let cfg = Config::default();
        assert!(matches!(
            render_ra(&cfg, &addr("fe80::1"), &addr("ff02::1")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_ra_source() {
        let cfg = config::parse("[tunnel]\nlocal_address = \"fe80::1\"").unwrap();

        // Sent to all-routers: answer from the configured address
        assert_eq!(ra_source(&cfg, addr("ff02::2")), addr("fe80::1"));
        // Sent to one of our unicast addresses: answer from it
        assert_eq!(ra_source(&cfg, addr("fe80::99")), addr("fe80::99"));
    }
}
