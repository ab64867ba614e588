//! Neighbor Discovery - RFC 4861 (RA/RS, MTU option), RFC 4191 (Route Information)
//!
//! Messages are encoded straight into a [`PacketBuffer`]; nothing here
//! allocates. Field offsets are relative to the start of each message or
//! option:
//!
//! ```text
//! RA:  type(0) code(1) checksum(2..4) hop-limit(4) flags(5)
//!      router-lifetime(6..8) reachable-time(8..12) retrans-timer(12..16)
//! RS:  type(0) code(1) checksum(2..4) reserved(4..8)
//! MTU: type(0)=5 len(1)=1 reserved(2..4) mtu(4..8)
//! RIO: type(0)=24 len(1) prefix-len(2) flags(3) lifetime(4..8) prefix(8..)
//! ```

use super::checksum;
use super::icmpv6::{Icmpv6Type, NdpOptionType};
use super::ipv6::{mask_address, Ipv6Header, Ipv6Prefix};
use crate::buffer::PacketBuffer;
use crate::{Error, Result};
use std::net::Ipv6Addr;

/// Router Advertisement header size (without options)
pub const RA_HEADER_SIZE: usize = 16;

/// Router Solicitation header size (without options)
pub const RS_HEADER_SIZE: usize = 8;

/// MTU option size
pub const MTU_OPTION_SIZE: usize = 8;

/// Route Information option size without the prefix field
pub const RIO_HEADER_SIZE: usize = 8;

/// M flag: addresses available via DHCPv6
pub const RA_FLAG_MANAGED: u8 = 0x80;

/// O flag: other configuration available via DHCPv6
pub const RA_FLAG_OTHER: u8 = 0x40;

const PREFERENCE_MASK: u8 = 0x18;

/// Route preference carried in the RIO flags byte (RFC 4191 §2.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutePreference {
    High,
    #[default]
    Medium,
    Low,
}

impl RoutePreference {
    pub fn to_bits(self) -> u8 {
        match self {
            RoutePreference::High => 0x08,
            RoutePreference::Medium => 0x00,
            RoutePreference::Low => 0x18,
        }
    }

    /// Decode from a flags byte; the reserved value 0x10 reads as Medium
    pub fn from_bits(flags: u8) -> Self {
        match flags & PREFERENCE_MASK {
            0x08 => RoutePreference::High,
            0x18 => RoutePreference::Low,
            _ => RoutePreference::Medium,
        }
    }
}

/// Number of prefix bytes a RIO carries for `prefix_len`
pub fn rio_prefix_bytes(prefix_len: u8) -> Result<usize> {
    match prefix_len {
        0 => Ok(0),
        1..=64 => Ok(8),
        65..=128 => Ok(16),
        _ => Err(Error::InvalidPrefixLength(prefix_len)),
    }
}

/// Read type and length (in bytes) of the option starting at `bytes[0]`
fn option_header(bytes: &[u8], expected: NdpOptionType) -> Result<usize> {
    if bytes.len() < 2 {
        return Err(Error::MalformedPacket("NDP option truncated".into()));
    }
    if bytes[0] != expected as u8 {
        return Err(Error::MalformedPacket(format!(
            "expected NDP option {}, got {}",
            expected as u8, bytes[0]
        )));
    }

    let len = bytes[1] as usize * 8;
    if len == 0 {
        return Err(Error::MalformedPacket("NDP option with zero length".into()));
    }
    if len > bytes.len() {
        return Err(Error::MalformedPacket(format!(
            "NDP option claims {} bytes, {} present",
            len,
            bytes.len()
        )));
    }
    Ok(len)
}

/// MTU option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtuOption {
    pub mtu: u32,
}

impl MtuOption {
    pub fn encode(&self, buf: &mut PacketBuffer<'_>) -> Result<()> {
        let opt = buf.reserve_back(MTU_OPTION_SIZE)?;
        opt[0] = NdpOptionType::Mtu as u8;
        opt[1] = 1;
        opt[4..8].copy_from_slice(&self.mtu.to_be_bytes());
        Ok(())
    }

    /// Decode the option at the start of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let len = option_header(bytes, NdpOptionType::Mtu)?;
        if len != MTU_OPTION_SIZE {
            return Err(Error::MalformedPacket(format!(
                "MTU option length {} (expected {})",
                len, MTU_OPTION_SIZE
            )));
        }

        Ok(Self {
            mtu: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

/// Route Information option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInfoOption {
    pub prefix: Ipv6Addr,
    pub prefix_len: u8,
    pub preference: RoutePreference,
    /// Route lifetime in seconds (0xFFFFFFFF = infinite)
    pub lifetime: u32,
}

impl RouteInfoOption {
    pub fn new(
        prefix: Ipv6Addr,
        prefix_len: u8,
        lifetime: u32,
        preference: RoutePreference,
    ) -> Self {
        Self {
            prefix,
            prefix_len,
            preference,
            lifetime,
        }
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> Result<usize> {
        Ok(RIO_HEADER_SIZE + rio_prefix_bytes(self.prefix_len)?)
    }

    pub fn encode(&self, buf: &mut PacketBuffer<'_>) -> Result<()> {
        let prefix_bytes = rio_prefix_bytes(self.prefix_len)?;

        let opt = buf.reserve_back(RIO_HEADER_SIZE + prefix_bytes)?;
        opt[0] = NdpOptionType::RouteInformation as u8;
        opt[1] = (1 + prefix_bytes / 8) as u8;
        opt[2] = self.prefix_len;
        opt[3] = self.preference.to_bits();
        opt[4..8].copy_from_slice(&self.lifetime.to_be_bytes());
        opt[8..].copy_from_slice(&self.prefix.octets()[..prefix_bytes]);
        Ok(())
    }

    /// Decode the option at the start of `bytes`, returning it with its size.
    ///
    /// Prefix bits past the prefix length are cleared.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let len = option_header(bytes, NdpOptionType::RouteInformation)?;
        if len < RIO_HEADER_SIZE || len > RIO_HEADER_SIZE + 16 {
            return Err(Error::MalformedPacket(format!(
                "Route Information length {} out of range",
                len
            )));
        }

        let prefix_len = bytes[2];
        let prefix_bytes = rio_prefix_bytes(prefix_len).map_err(|_| {
            Error::MalformedPacket(format!("Route Information prefix length {}", prefix_len))
        })?;
        if len != RIO_HEADER_SIZE + prefix_bytes {
            return Err(Error::MalformedPacket(format!(
                "Route Information length {} does not match /{}",
                len, prefix_len
            )));
        }

        let mut octets = [0u8; 16];
        octets[..prefix_bytes].copy_from_slice(&bytes[RIO_HEADER_SIZE..len]);

        let option = Self {
            prefix: mask_address(&Ipv6Addr::from(octets), prefix_len),
            prefix_len,
            preference: RoutePreference::from_bits(bytes[3]),
            lifetime: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        };
        Ok((option, len))
    }
}

/// Append an MTU option
pub fn build_mtu_option(buf: &mut PacketBuffer<'_>, mtu: u32) -> Result<MtuOption> {
    let option = MtuOption { mtu };
    option.encode(buf)?;
    Ok(option)
}

/// Append a Route Information option
pub fn build_route_info_option(
    buf: &mut PacketBuffer<'_>,
    prefix: &Ipv6Addr,
    prefix_len: u8,
    lifetime: u32,
    preference: RoutePreference,
) -> Result<RouteInfoOption> {
    let option = RouteInfoOption::new(*prefix, prefix_len, lifetime, preference);
    option.encode(buf)?;
    Ok(option)
}

/// Consume an MTU option from the front of `buf`
pub fn parse_mtu_option(buf: &mut PacketBuffer<'_>) -> Result<MtuOption> {
    let option = MtuOption::decode(buf.data())?;
    buf.consume_front(MTU_OPTION_SIZE)?;
    Ok(option)
}

/// Consume a Route Information option from the front of `buf`
pub fn parse_route_info_option(buf: &mut PacketBuffer<'_>) -> Result<RouteInfoOption> {
    let (option, len) = RouteInfoOption::decode(buf.data())?;
    buf.consume_front(len)?;
    Ok(option)
}

/// Option found while walking an NDP option list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NdOption<'a> {
    Mtu(MtuOption),
    RouteInfo(RouteInfoOption),
    /// Any other option, with its full TLV bytes
    Other { kind: u8, data: &'a [u8] },
}

/// Iterator over the TLV options following an ND message header.
///
/// A zero-length or truncated option yields one error and ends iteration.
#[derive(Debug, Clone)]
pub struct NdOptions<'a> {
    bytes: &'a [u8],
}

impl<'a> NdOptions<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn next_option(&mut self) -> Result<NdOption<'a>> {
        let bytes = self.bytes;
        if bytes.len() < 2 {
            return Err(Error::MalformedPacket("NDP option truncated".into()));
        }

        let len = bytes[1] as usize * 8;
        if len == 0 || len > bytes.len() {
            return Err(Error::MalformedPacket(format!(
                "NDP option type {} has invalid length {}",
                bytes[0], len
            )));
        }

        let option = match NdpOptionType::from_u8(bytes[0]) {
            Some(NdpOptionType::Mtu) => NdOption::Mtu(MtuOption::decode(bytes)?),
            Some(NdpOptionType::RouteInformation) => {
                NdOption::RouteInfo(RouteInfoOption::decode(bytes)?.0)
            }
            _ => NdOption::Other {
                kind: bytes[0],
                data: &bytes[..len],
            },
        };

        self.bytes = &bytes[len..];
        Ok(option)
    }
}

impl<'a> Iterator for NdOptions<'a> {
    type Item = Result<NdOption<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bytes.is_empty() {
            return None;
        }

        let option = self.next_option();
        if option.is_err() {
            self.bytes = &[];
        }
        Some(option)
    }
}

/// Router policy values placed into every advertisement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaPolicy {
    /// Current hop limit to advertise (0 = unspecified)
    pub cur_hop_limit: u8,
    /// M flag
    pub managed: bool,
    /// O flag
    pub other: bool,
    /// Router lifetime in seconds (0 = not a default router)
    pub router_lifetime: u16,
    /// Reachable time in milliseconds (0 = unspecified)
    pub reachable_time: u32,
    /// Retrans timer in milliseconds (0 = unspecified)
    pub retrans_timer: u32,
    /// Link MTU for the MTU option
    pub mtu: u32,
    /// Lifetime of every advertised route, in seconds
    pub route_lifetime: u32,
}

impl Default for RaPolicy {
    fn default() -> Self {
        Self {
            cur_hop_limit: 64,
            managed: false,
            other: false,
            router_lifetime: 1800,
            reachable_time: 0,
            retrans_timer: 0,
            mtu: 1280,
            route_lifetime: u32::MAX,
        }
    }
}

impl RaPolicy {
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.managed {
            flags |= RA_FLAG_MANAGED;
        }
        if self.other {
            flags |= RA_FLAG_OTHER;
        }
        flags
    }
}

/// Router Advertisement header as written to or read from a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterAdvertisement {
    pub cur_hop_limit: u8,
    pub flags: u8,
    pub router_lifetime: u16,
    pub reachable_time: u32,
    pub retrans_timer: u32,
    pub checksum: u16,
    /// Whole message length, options included
    pub length: usize,
}

impl RouterAdvertisement {
    pub fn managed(&self) -> bool {
        self.flags & RA_FLAG_MANAGED != 0
    }

    pub fn other(&self) -> bool {
        self.flags & RA_FLAG_OTHER != 0
    }

    fn decode(message: &[u8]) -> Result<Self> {
        if message.len() < RA_HEADER_SIZE {
            return Err(Error::MalformedPacket("Router Advertisement too short".into()));
        }
        if message[0] != Icmpv6Type::RouterAdvertisement as u8 || message[1] != 0 {
            return Err(Error::MalformedPacket(format!(
                "expected Router Advertisement, got ICMPv6 type {} code {}",
                message[0], message[1]
            )));
        }

        Ok(Self {
            cur_hop_limit: message[4],
            flags: message[5],
            router_lifetime: u16::from_be_bytes([message[6], message[7]]),
            reachable_time: u32::from_be_bytes([message[8], message[9], message[10], message[11]]),
            retrans_timer: u32::from_be_bytes([message[12], message[13], message[14], message[15]]),
            checksum: u16::from_be_bytes([message[2], message[3]]),
            length: message.len(),
        })
    }
}

/// Append a complete, checksummed Router Advertisement to `buf`.
///
/// The message carries one MTU option, a high-preference RIO for the
/// tunnel's own `network/prefix_len`, and a low-preference RIO for each
/// `address/prefixlen` entry of `other_routes`. On error the buffer is left
/// exactly as it was.
pub fn build_router_advertisement<S: AsRef<str>>(
    buf: &mut PacketBuffer<'_>,
    policy: &RaPolicy,
    src: &Ipv6Addr,
    dst: &Ipv6Addr,
    network: &Ipv6Addr,
    prefix_len: u8,
    other_routes: &[S],
) -> Result<RouterAdvertisement> {
    let mark = buf.mark();
    let result = write_router_advertisement(buf, policy, src, dst, network, prefix_len, other_routes);
    if result.is_err() {
        buf.reset(mark);
    }
    result
}

fn write_router_advertisement<S: AsRef<str>>(
    buf: &mut PacketBuffer<'_>,
    policy: &RaPolicy,
    src: &Ipv6Addr,
    dst: &Ipv6Addr,
    network: &Ipv6Addr,
    prefix_len: u8,
    other_routes: &[S],
) -> Result<RouterAdvertisement> {
    let start = buf.mark();

    let header = buf.reserve_back(RA_HEADER_SIZE)?;
    header[0] = Icmpv6Type::RouterAdvertisement as u8;
    header[4] = policy.cur_hop_limit;
    header[5] = policy.flags();
    header[6..8].copy_from_slice(&policy.router_lifetime.to_be_bytes());
    header[8..12].copy_from_slice(&policy.reachable_time.to_be_bytes());
    header[12..16].copy_from_slice(&policy.retrans_timer.to_be_bytes());

    build_mtu_option(buf, policy.mtu)?;
    build_route_info_option(
        buf,
        network,
        prefix_len,
        policy.route_lifetime,
        RoutePreference::High,
    )?;

    for route in other_routes {
        let route: Ipv6Prefix = route.as_ref().parse()?;
        build_route_info_option(
            buf,
            &route.addr,
            route.prefix_len,
            policy.route_lifetime,
            RoutePreference::Low,
        )?;
    }

    let message = buf.appended_mut(start);
    checksum::write_checksum(message, src, dst);
    RouterAdvertisement::decode(message)
}

/// Consume the Router Advertisement header at the front of `buf`.
///
/// Options stay in the buffer; walk them with [`NdOptions`].
pub fn parse_router_advertisement(buf: &mut PacketBuffer<'_>) -> Result<RouterAdvertisement> {
    let ra = RouterAdvertisement::decode(buf.data())?;
    buf.consume_front(RA_HEADER_SIZE)?;
    Ok(ra)
}

/// Router Solicitation received from the tunnel peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterSolicitation {
    pub code: u8,
    pub checksum: u16,
    /// Solicitor address (unspecified during address configuration)
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
    pub hop_limit: u8,
}

impl RouterSolicitation {
    /// Where an answering advertisement should go (RFC 4861 §6.2.6)
    pub fn reply_destination(&self) -> Ipv6Addr {
        if self.source.is_unspecified() {
            super::ipv6::ALL_NODES
        } else {
            self.source
        }
    }
}

/// Consume a Router Solicitation header from the front of `buf`.
///
/// The inbound checksum is not verified. On failure the cursor is unchanged.
pub fn parse_router_solicitation(
    buf: &mut PacketBuffer<'_>,
    ip_header: &Ipv6Header,
) -> Result<RouterSolicitation> {
    let message = buf.data();
    if message.len() < RS_HEADER_SIZE {
        return Err(Error::MalformedPacket("Router Solicitation too short".into()));
    }
    if message[0] != Icmpv6Type::RouterSolicitation as u8 {
        return Err(Error::MalformedPacket(format!(
            "expected Router Solicitation, got ICMPv6 type {}",
            message[0]
        )));
    }

    let rs = RouterSolicitation {
        code: message[1],
        checksum: u16::from_be_bytes([message[2], message[3]]),
        source: ip_header.src,
        destination: ip_header.dst,
        hop_limit: ip_header.hop_limit,
    };
    buf.consume_front(RS_HEADER_SIZE)?;
    Ok(rs)
}
