//! ICMPv6 Neighbor Discovery and Echo engine
//!
//! Every build and parse call works on a caller-supplied [`PacketBuffer`]
//! and completes synchronously. Builders are atomic: on error the buffer
//! cursors are restored. Parsers never advance the cursor on error.
//!
//! [`PacketBuffer`]: crate::buffer::PacketBuffer

pub mod checksum;
pub mod echo;
pub mod icmpv6;
pub mod ipv6;
pub mod ndp;

pub use echo::{build_echo_request, echo_request_to_reply, parse_echo, EchoMessage};
pub use icmpv6::{Icmpv6Packet, Icmpv6Type, NdpOptionType};
pub use ipv6::{Ipv6Header, Ipv6Prefix};
pub use ndp::{
    build_mtu_option, build_route_info_option, build_router_advertisement, parse_mtu_option,
    parse_route_info_option, parse_router_advertisement, parse_router_solicitation, MtuOption,
    NdOption, NdOptions, RaPolicy, RouteInfoOption, RoutePreference, RouterAdvertisement,
    RouterSolicitation,
};
