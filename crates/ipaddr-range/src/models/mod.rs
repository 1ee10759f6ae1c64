//! Segment, section and address models

mod address;
mod family;
mod section;
mod segment;

/// Segment value type
pub type SegInt = u32;

/// Bit count and prefix length type
pub type BitCount = u32;

pub use address::{Address, Ipv4Address, Ipv6Address, MacAddress, Zone};
pub use family::AddressFamily;
pub use section::Section;
pub use segment::{Segment, MAX_SEGMENT_BITS};

pub(crate) use segment::{segment_host_mask, segment_network_mask, segment_prefix_len};
