//! Opcode list codec
//!
//! Converts between the big-endian opcode list blob and an ordered sequence of
//! [`Opcode`](crate::opcode_pipeline::opcodes::Opcode) values:
//!
//! ```text
//! u32 opcodeCount
//! repeat opcodeCount times:
//!   u32 id, u32 version, u32 flags, u32 payloadLength, byte[payloadLength]
//! ```

mod reader;
mod writer;


pub use reader::{decode, decode_stage};
pub use writer::{encode, encode_stage};

/// id + version + flags + payload length
pub(crate) const RECORD_HEADER_LEN: usize = 16;
/// plane count + optical center
pub(crate) const WARP_FIXED_LEN: usize = 4 + 2 * 8;
/// four radial and two tangential f64 terms
pub(crate) const WARP_PLANE_LEN: usize = 6 * 8;
pub(crate) const VIGNETTE_LEN: usize = 7 * 8;
pub(crate) const TRIM_LEN: usize = 4 * 4;
/// ten u32 fields, four f64 fields and the map plane count
pub(crate) const GAIN_MAP_HEADER_LEN: usize = 10 * 4 + 4 * 8 + 4;
