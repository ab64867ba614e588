//! ICMPv6 common header - RFC 4443

use crate::{Error, Result};

/// Minimum ICMPv6 header size
pub const MIN_HEADER_SIZE: usize = 4;

/// ICMPv6 message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Icmpv6Type {
    DestinationUnreachable = 1,
    PacketTooBig = 2,
    TimeExceeded = 3,
    ParameterProblem = 4,
    EchoRequest = 128,
    EchoReply = 129,
    RouterSolicitation = 133,
    RouterAdvertisement = 134,
    NeighborSolicitation = 135,
    NeighborAdvertisement = 136,
    Redirect = 137,
}

impl Icmpv6Type {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Icmpv6Type::DestinationUnreachable),
            2 => Some(Icmpv6Type::PacketTooBig),
            3 => Some(Icmpv6Type::TimeExceeded),
            4 => Some(Icmpv6Type::ParameterProblem),
            128 => Some(Icmpv6Type::EchoRequest),
            129 => Some(Icmpv6Type::EchoReply),
            133 => Some(Icmpv6Type::RouterSolicitation),
            134 => Some(Icmpv6Type::RouterAdvertisement),
            135 => Some(Icmpv6Type::NeighborSolicitation),
            136 => Some(Icmpv6Type::NeighborAdvertisement),
            137 => Some(Icmpv6Type::Redirect),
            _ => None,
        }
    }
}

/// NDP option types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NdpOptionType {
    SourceLinkLayerAddress = 1,
    TargetLinkLayerAddress = 2,
    PrefixInformation = 3,
    RedirectedHeader = 4,
    Mtu = 5,
    /// RFC 4191
    RouteInformation = 24,
}

impl NdpOptionType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NdpOptionType::SourceLinkLayerAddress),
            2 => Some(NdpOptionType::TargetLinkLayerAddress),
            3 => Some(NdpOptionType::PrefixInformation),
            4 => Some(NdpOptionType::RedirectedHeader),
            5 => Some(NdpOptionType::Mtu),
            24 => Some(NdpOptionType::RouteInformation),
            _ => None,
        }
    }
}

/// Parsed ICMPv6 header (zero-copy reference)
#[derive(Debug)]
pub struct Icmpv6Packet<'a> {
    buffer: &'a [u8],
}

impl<'a> Icmpv6Packet<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < MIN_HEADER_SIZE {
            return Err(Error::MalformedPacket("ICMPv6 packet too short".into()));
        }

        Ok(Self { buffer })
    }

    /// Message type
    pub fn msg_type(&self) -> u8 {
        self.buffer[0]
    }

    /// Known message type, if any
    pub fn message_type(&self) -> Option<Icmpv6Type> {
        Icmpv6Type::from_u8(self.msg_type())
    }

    /// Message code
    pub fn code(&self) -> u8 {
        self.buffer[1]
    }

    /// Checksum
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.buffer[2], self.buffer[3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icmpv6_type_from_u8() {
        assert_eq!(
            Icmpv6Type::from_u8(1),
            Some(Icmpv6Type::DestinationUnreachable)
        );
        assert_eq!(Icmpv6Type::from_u8(128), Some(Icmpv6Type::EchoRequest));
        assert_eq!(Icmpv6Type::from_u8(129), Some(Icmpv6Type::EchoReply));
        assert_eq!(
            Icmpv6Type::from_u8(133),
            Some(Icmpv6Type::RouterSolicitation)
        );
        assert_eq!(
            Icmpv6Type::from_u8(134),
            Some(Icmpv6Type::RouterAdvertisement)
        );
        assert_eq!(Icmpv6Type::from_u8(255), None);
    }

    #[test]
    fn test_ndp_option_type_from_u8() {
        assert_eq!(NdpOptionType::from_u8(5), Some(NdpOptionType::Mtu));
        assert_eq!(
            NdpOptionType::from_u8(24),
            Some(NdpOptionType::RouteInformation)
        );
        assert_eq!(NdpOptionType::from_u8(25), None);
    }

    #[test]
    fn test_icmpv6_parse() {
        let data = [0x80, 0x00, 0xAB, 0xCD, 0x00, 0x01, 0x00, 0x02];
        let pkt = Icmpv6Packet::parse(&data).unwrap();

        assert_eq!(pkt.msg_type(), 128);
        assert_eq!(pkt.message_type(), Some(Icmpv6Type::EchoRequest));
        assert_eq!(pkt.code(), 0);
        assert_eq!(pkt.checksum(), 0xABCD);
    }

    #[test]
    fn test_icmpv6_parse_too_short() {
        assert!(matches!(
            Icmpv6Packet::parse(&[0x80, 0x00, 0x00]),
            Err(Error::MalformedPacket(_))
        ));
    }
}
