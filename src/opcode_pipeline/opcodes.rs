//! Opcode model module
//!
//! Typed representation of the correction instructions carried in an opcode
//! list: a shared header plus one payload variant per opcode kind.

pub mod types;
mod validation;

pub use types::{
    DNG_VERSION_1_3, FixVignetteRadial, GainMap, Opcode, OpcodeFlags, OpcodeHeader, OpcodeId,
    OpcodePayload, OpcodeStage, TrimBounds, UnknownOpcode, WarpPlane, WarpRectilinear, for_stage,
};
