//! IPv6 header view and prefix parsing - RFC 8200, RFC 4291

use super::checksum::NEXT_HEADER_ICMPV6;
use crate::buffer::PacketBuffer;
use crate::{Error, Result};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

/// IPv6 header size (fixed, unlike IPv4)
pub const HEADER_SIZE: usize = 40;

/// Hop limit required on Neighbor Discovery messages (RFC 4861 §6.1)
pub const ND_HOP_LIMIT: u8 = 255;

/// All-nodes link-local multicast address
pub const ALL_NODES: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1);

/// Largest packet without a jumbo payload: header plus a 16-bit payload length
pub const MAX_PACKET_SIZE: usize = HEADER_SIZE + u16::MAX as usize;

/// Decoded fixed IPv6 header.
///
/// The engine only reads the addresses (for the checksum pseudo-header) and
/// the payload length and hop limit; it never writes an IPv6 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Header {
    pub traffic_class: u8,
    pub flow_label: u32,
    pub payload_length: u16,
    pub next_header: u8,
    pub hop_limit: u8,
    pub src: Ipv6Addr,
    pub dst: Ipv6Addr,
}

impl Ipv6Header {
    /// Header for an ICMPv6 exchange between `src` and `dst`
    pub fn new(src: Ipv6Addr, dst: Ipv6Addr) -> Self {
        Self {
            traffic_class: 0,
            flow_label: 0,
            payload_length: 0,
            next_header: NEXT_HEADER_ICMPV6,
            hop_limit: ND_HOP_LIMIT,
            src,
            dst,
        }
    }

    pub fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            return Err(Error::Parse("IPv6 header too short".into()));
        }

        let version = buffer[0] >> 4;
        if version != 6 {
            return Err(Error::Parse("not an IPv6 packet".into()));
        }

        let src: [u8; 16] = buffer[8..24]
            .try_into()
            .map_err(|_| Error::Parse("IPv6 source address truncated".into()))?;
        let dst: [u8; 16] = buffer[24..40]
            .try_into()
            .map_err(|_| Error::Parse("IPv6 destination address truncated".into()))?;

        Ok(Self {
            traffic_class: ((buffer[0] & 0x0F) << 4) | (buffer[1] >> 4),
            flow_label: u32::from_be_bytes([0, buffer[1] & 0x0F, buffer[2], buffer[3]]),
            payload_length: u16::from_be_bytes([buffer[4], buffer[5]]),
            next_header: buffer[6],
            hop_limit: buffer[7],
            src: Ipv6Addr::from(src),
            dst: Ipv6Addr::from(dst),
        })
    }

    /// Consume the IPv6 header from the front of `buf`.
    ///
    /// The cursor is left in place if the header does not parse.
    pub fn pull(buf: &mut PacketBuffer<'_>) -> Result<Self> {
        let header = Self::parse(buf.data())?;
        buf.consume_front(HEADER_SIZE)?;
        Ok(header)
    }

    pub fn is_icmpv6(&self) -> bool {
        self.next_header == NEXT_HEADER_ICMPV6
    }
}

/// IPv6 prefix written as `address/prefixlen`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Prefix {
    pub addr: Ipv6Addr,
    pub prefix_len: u8,
}

impl Ipv6Prefix {
    pub fn new(addr: Ipv6Addr, prefix_len: u8) -> Result<Self> {
        if prefix_len > 128 {
            return Err(Error::InvalidPrefixLength(prefix_len));
        }
        Ok(Self { addr, prefix_len })
    }

    /// Address with every bit past the prefix length cleared
    pub fn network(&self) -> Ipv6Addr {
        mask_address(&self.addr, self.prefix_len)
    }
}

impl FromStr for Ipv6Prefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidAddressString(s.to_string());

        let (addr, prefix_len) = s.trim().split_once('/').ok_or_else(invalid)?;
        let addr: Ipv6Addr = addr.parse().map_err(|_| invalid())?;
        let prefix_len: u8 = prefix_len.parse().map_err(|_| invalid())?;

        Self::new(addr, prefix_len).map_err(|_| invalid())
    }
}

impl fmt::Display for Ipv6Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

/// Clear all bits of `addr` beyond `prefix_len`
pub fn mask_address(addr: &Ipv6Addr, prefix_len: u8) -> Ipv6Addr {
    let mask = match prefix_len {
        0 => 0,
        len if len >= 128 => u128::MAX,
        len => u128::MAX << (128 - len as u32),
    };
    Ipv6Addr::from(u128::from(*addr) & mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header() -> Vec<u8> {
        let mut header = vec![
            0x60, 0x00, 0x00, 0x00, // Version 6, TC 0, flow 0
            0x00, 0x08, // Payload length 8
            58,   // Next header ICMPv6
            255,  // Hop limit
        ];
        header.extend_from_slice(&"fe80::2".parse::<Ipv6Addr>().unwrap().octets());
        header.extend_from_slice(&"ff02::2".parse::<Ipv6Addr>().unwrap().octets());
        header
    }

    #[test]
    fn test_ipv6_parse() {
        let data = make_header();
        let header = Ipv6Header::parse(&data).unwrap();

        assert_eq!(header.payload_length, 8);
        assert_eq!(header.hop_limit, 255);
        assert!(header.is_icmpv6());
        assert_eq!(header.src, "fe80::2".parse::<Ipv6Addr>().unwrap());
        assert_eq!(header.dst, "ff02::2".parse::<Ipv6Addr>().unwrap());
    }

    #[test]
    fn test_ipv6_parse_traffic_class_and_flow_label() {
        let mut data = make_header();
        data[0] = 0x6A;
        data[1] = 0xB1;
        data[2] = 0x23;
        data[3] = 0x45;
        let header = Ipv6Header::parse(&data).unwrap();

        assert_eq!(header.traffic_class, 0xAB);
        assert_eq!(header.flow_label, 0x12345);
    }

    #[test]
    fn test_ipv6_parse_too_short() {
        assert!(Ipv6Header::parse(&[0x60; 39]).is_err());
    }

    #[test]
    fn test_ipv6_parse_wrong_version() {
        let mut data = make_header();
        data[0] = 0x45;
        assert!(Ipv6Header::parse(&data).is_err());
    }

    #[test]
    fn test_ipv6_pull() {
        let mut data = make_header();
        data.extend_from_slice(&[133, 0, 0, 0, 0, 0, 0, 0]);
        let mut buf = PacketBuffer::from_packet(&mut data);

        let header = Ipv6Header::pull(&mut buf).unwrap();
        assert_eq!(header.src, "fe80::2".parse::<Ipv6Addr>().unwrap());
        assert_eq!(buf.len(), 8);
        assert_eq!(buf.data()[0], 133);
    }

    #[test]
    fn test_ipv6_pull_failure_keeps_cursor() {
        let mut data = make_header();
        data[0] = 0x40;
        let mut buf = PacketBuffer::from_packet(&mut data);

        assert!(Ipv6Header::pull(&mut buf).is_err());
        assert_eq!(buf.len(), HEADER_SIZE);
    }

    #[test]
    fn test_prefix_parse() {
        let prefix: Ipv6Prefix = "2001:db8:1::/48".parse().unwrap();
        assert_eq!(prefix.addr, "2001:db8:1::".parse::<Ipv6Addr>().unwrap());
        assert_eq!(prefix.prefix_len, 48);
        assert_eq!(prefix.to_string(), "2001:db8:1::/48");
    }

    #[test]
    fn test_prefix_parse_invalid() {
        for input in [
            "2001:db8::",
            "2001:db8::/",
            "2001:db8::/129",
            "2001:db8::/-1",
            "not-an-address/64",
            "10.0.0.0/8",
            "",
        ] {
            assert!(
                matches!(
                    input.parse::<Ipv6Prefix>(),
                    Err(Error::InvalidAddressString(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_prefix_new_rejects_long_prefix() {
        assert!(matches!(
            Ipv6Prefix::new(Ipv6Addr::UNSPECIFIED, 129),
            Err(Error::InvalidPrefixLength(129))
        ));
    }

    #[test]
    fn test_mask_address() {
        let addr: Ipv6Addr = "2001:db8:1:2:3:4:5:6".parse().unwrap();
        assert_eq!(mask_address(&addr, 0), Ipv6Addr::UNSPECIFIED);
        assert_eq!(
            mask_address(&addr, 48),
            "2001:db8:1::".parse::<Ipv6Addr>().unwrap()
        );
        assert_eq!(mask_address(&addr, 128), addr);

        let prefix = Ipv6Prefix::new(addr, 64).unwrap();
        assert_eq!(prefix.network(), "2001:db8:1:2::".parse::<Ipv6Addr>().unwrap());
    }
}
