use tracing::{debug, instrument, warn};

use crate::opcode_pipeline::codec::{GAIN_MAP_HEADER_LEN, RECORD_HEADER_LEN};
use crate::opcode_pipeline::opcodes::{Opcode, OpcodePayload, OpcodeStage};

#[derive(Default)]
struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn bytes(&mut self, value: &[u8]) {
        self.buf.extend_from_slice(value);
    }
}

/// Narrows a count or byte length to its u32 wire field, saturating with a
/// warning when it does not fit.
pub(super) fn wire_len(len: usize, field: &'static str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| {
        warn!(len, field, "Length exceeds the u32 wire field, saturating");
        u32::MAX
    })
}

/// Encodes every opcode, enabled or not, in list order.
pub fn encode(opcodes: &[Opcode]) -> Vec<u8> {
    write_list(opcodes.iter().collect())
}

/// Encodes only the opcodes tagged with `stage`.
pub fn encode_stage(opcodes: &[Opcode], stage: OpcodeStage) -> Vec<u8> {
    write_list(
        opcodes
            .iter()
            .filter(|op| op.header.stage == stage)
            .collect(),
    )
}

#[instrument(level = "debug", skip(opcodes), fields(count = opcodes.len()))]
fn write_list(opcodes: Vec<&Opcode>) -> Vec<u8> {
    let mut out = ByteWriter::with_capacity(4 + opcodes.len() * RECORD_HEADER_LEN);
    out.u32(wire_len(opcodes.len(), "opcode count"));
    for opcode in opcodes {
        let payload = payload_bytes(&opcode.payload);
        out.u32(opcode.id().code());
        out.u32(opcode.header.version);
        out.u32(opcode.header.flags.bits());
        out.u32(wire_len(payload.len(), "payload length"));
        out.bytes(&payload);
    }
    debug!(bytes = out.buf.len(), "Encoded opcode list");
    out.buf
}

/// Payload length is always derived from the current contents.
fn payload_bytes(payload: &OpcodePayload) -> Vec<u8> {
    let mut w = ByteWriter::default();
    match payload {
        OpcodePayload::WarpRectilinear(warp) => {
            w.u32(wire_len(warp.planes.len(), "warp plane count"));
            for plane in &warp.planes {
                plane.radial.iter().for_each(|&k| w.f64(k));
                plane.tangential.iter().for_each(|&k| w.f64(k));
            }
            w.f64(warp.center_x);
            w.f64(warp.center_y);
        }
        OpcodePayload::FixVignetteRadial(vignette) => {
            vignette.k.iter().for_each(|&k| w.f64(k));
            w.f64(vignette.center_x);
            w.f64(vignette.center_y);
        }
        OpcodePayload::TrimBounds(trim) => {
            w.u32(trim.top);
            w.u32(trim.left);
            w.u32(trim.bottom);
            w.u32(trim.right);
        }
        OpcodePayload::GainMap(map) => {
            w.buf.reserve(GAIN_MAP_HEADER_LEN + map.gains.len() * 4);
            for field in [
                map.top,
                map.left,
                map.bottom,
                map.right,
                map.plane,
                map.planes,
                map.row_pitch,
                map.col_pitch,
                map.map_points_v,
                map.map_points_h,
            ] {
                w.u32(field);
            }
            w.f64(map.map_spacing_v);
            w.f64(map.map_spacing_h);
            w.f64(map.map_origin_v);
            w.f64(map.map_origin_h);
            w.u32(map.map_planes);
            map.gains.iter().for_each(|&g| w.f32(g));
        }
        OpcodePayload::Unknown(unknown) => w.bytes(&unknown.data),
    }
    w.buf
}
