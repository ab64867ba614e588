//! ndtun - ICMPv6 Neighbor Discovery and Echo for point-to-point tunnels
//!
//! Builds and parses Router Advertisements, Router Solicitations, MTU and
//! Route Information options, and Echo Request/Reply messages directly in a
//! caller-owned packet buffer, so the peer of a virtual interface sees a
//! router without one being on-link.

pub mod buffer;
pub mod config;
pub mod error;
pub mod protocol;
pub mod telemetry;

pub use buffer::PacketBuffer;
pub use error::{Error, Result};
