//! ICMPv6 Echo Request/Reply - RFC 4443 §4

use super::checksum;
use super::icmpv6::Icmpv6Type;
use super::ipv6::Ipv6Header;
use crate::buffer::PacketBuffer;
use crate::{Error, Result};
use std::net::Ipv6Addr;

/// Echo header size: type, code, checksum, identifier, sequence
pub const ECHO_HEADER_SIZE: usize = 8;

/// Echo message header as found in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoMessage {
    pub msg_type: Icmpv6Type,
    pub identifier: u16,
    pub sequence: u16,
    pub checksum: u16,
    pub payload_len: usize,
}

impl EchoMessage {
    pub fn is_request(&self) -> bool {
        self.msg_type == Icmpv6Type::EchoRequest
    }

    pub fn is_reply(&self) -> bool {
        self.msg_type == Icmpv6Type::EchoReply
    }

    fn decode(message: &[u8]) -> Result<Self> {
        if message.len() < ECHO_HEADER_SIZE {
            return Err(Error::MalformedPacket("Echo message too short".into()));
        }

        let msg_type = match Icmpv6Type::from_u8(message[0]) {
            Some(t @ (Icmpv6Type::EchoRequest | Icmpv6Type::EchoReply)) => t,
            _ => {
                return Err(Error::MalformedPacket(format!(
                    "expected Echo message, got ICMPv6 type {}",
                    message[0]
                )))
            }
        };

        Ok(Self {
            msg_type,
            identifier: u16::from_be_bytes([message[4], message[5]]),
            sequence: u16::from_be_bytes([message[6], message[7]]),
            checksum: u16::from_be_bytes([message[2], message[3]]),
            payload_len: message.len() - ECHO_HEADER_SIZE,
        })
    }
}

/// Append a checksummed Echo Request carrying `payload`
pub fn build_echo_request(
    buf: &mut PacketBuffer<'_>,
    src: &Ipv6Addr,
    dst: &Ipv6Addr,
    identifier: u16,
    sequence: u16,
    payload: &[u8],
) -> Result<EchoMessage> {
    let message = buf.reserve_back(ECHO_HEADER_SIZE + payload.len())?;
    message[0] = Icmpv6Type::EchoRequest as u8;
    message[4..6].copy_from_slice(&identifier.to_be_bytes());
    message[6..8].copy_from_slice(&sequence.to_be_bytes());
    message[ECHO_HEADER_SIZE..].copy_from_slice(payload);

    checksum::write_checksum(message, src, dst);
    EchoMessage::decode(message)
}

/// Turn the Echo Request held in `buf` into an Echo Reply, in place.
///
/// Only the type byte and checksum change. The checksum is computed for the
/// reversed direction (`ip_header.dst` to `ip_header.src`); rewriting the
/// enclosing IPv6 header is up to the caller.
pub fn echo_request_to_reply(
    buf: &mut PacketBuffer<'_>,
    ip_header: &Ipv6Header,
) -> Result<EchoMessage> {
    let message = buf.data_mut();
    if message.len() < ECHO_HEADER_SIZE {
        return Err(Error::MalformedPacket("Echo Request too short".into()));
    }
    if message[0] != Icmpv6Type::EchoRequest as u8 {
        return Err(Error::MalformedPacket(format!(
            "expected Echo Request, got ICMPv6 type {}",
            message[0]
        )));
    }

    message[0] = Icmpv6Type::EchoReply as u8;
    checksum::write_checksum(message, &ip_header.dst, &ip_header.src);
    EchoMessage::decode(message)
}

/// Read the Echo Request or Reply at the front of `buf` without consuming it
pub fn parse_echo(buf: &PacketBuffer<'_>) -> Result<EchoMessage> {
    EchoMessage::decode(buf.data())
}
