//! ICMPv6 checksum over the IPv6 pseudo-header (RFC 8200 §8.1, RFC 4443 §2.3)

use std::net::Ipv6Addr;

/// Next Header value for ICMPv6 in the pseudo-header
pub const NEXT_HEADER_ICMPV6: u8 = 58;

/// Offset of the checksum field inside an ICMPv6 message
pub const CHECKSUM_OFFSET: usize = 2;

/// Add `data` to `sum` as big-endian 16-bit words, zero-padding an odd tail
fn sum_words(mut sum: u64, data: &[u8]) -> u64 {
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u16::from_be_bytes([word[0], word[1]]) as u64;
    }
    if let [last] = words.remainder() {
        sum += u16::from_be_bytes([*last, 0]) as u64;
    }
    sum
}

/// Pseudo-header: source(16) destination(16) length(4) zero(3) next header(1)
fn pseudo_header_sum(src: &Ipv6Addr, dst: &Ipv6Addr, upper_layer_len: u32) -> u64 {
    let mut sum = sum_words(0, &src.octets());
    sum = sum_words(sum, &dst.octets());
    sum += (upper_layer_len >> 16) as u64;
    sum += (upper_layer_len & 0xFFFF) as u64;
    sum + NEXT_HEADER_ICMPV6 as u64
}

/// End-around carry fold
fn fold(mut sum: u64) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// Calculate the checksum of an ICMPv6 message.
///
/// The checksum field (bytes 2..4) is treated as zero whatever it holds.
/// A result of 0x0000 is returned as-is; unlike UDP there is no 0xFFFF
/// substitution.
pub fn checksum(src: &Ipv6Addr, dst: &Ipv6Addr, message: &[u8]) -> u16 {
    let mut sum = pseudo_header_sum(src, dst, message.len() as u32);

    if message.len() > CHECKSUM_OFFSET + 2 {
        sum = sum_words(sum, &message[..CHECKSUM_OFFSET]);
        sum = sum_words(sum, &message[CHECKSUM_OFFSET + 2..]);
    } else {
        sum = sum_words(sum, &message[..message.len().min(CHECKSUM_OFFSET)]);
    }

    !fold(sum)
}

/// Compute and store the checksum in `message[2..4]`, returning it
pub fn write_checksum(message: &mut [u8], src: &Ipv6Addr, dst: &Ipv6Addr) -> u16 {
    let value = checksum(src, dst, message);
    message[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2].copy_from_slice(&value.to_be_bytes());
    value
}

/// Check a received message: the sum including the stored checksum must fold to 0xFFFF
pub fn verify(src: &Ipv6Addr, dst: &Ipv6Addr, message: &[u8]) -> bool {
    let sum = pseudo_header_sum(src, dst, message.len() as u32);
    fold(sum_words(sum, message)) == 0xFFFF
}
