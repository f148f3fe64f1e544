use tracing::{debug, instrument, warn};

use crate::opcode_pipeline::codec::{
    GAIN_MAP_HEADER_LEN, RECORD_HEADER_LEN, TRIM_LEN, VIGNETTE_LEN, WARP_FIXED_LEN, WARP_PLANE_LEN,
};
use crate::opcode_pipeline::common::error::{ParseError, ParseResult};
use crate::opcode_pipeline::opcodes::{
    FixVignetteRadial, GainMap, Opcode, OpcodeFlags, OpcodeHeader, OpcodeId, OpcodePayload,
    OpcodeStage, TrimBounds, UnknownOpcode, WarpPlane, WarpRectilinear,
};

/// Bounds-checked big-endian cursor. Offsets in errors are absolute
/// positions within the whole blob.
struct ByteReader<'a> {
    data: &'a [u8],
    base: usize,
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    fn at(data: &'a [u8], base: usize) -> Self {
        Self { data, base, pos: 0 }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> ParseResult<&'a [u8]> {
        let data: &'a [u8] = self.data;
        let slice = data[self.pos..]
            .get(..n)
            .ok_or(ParseError::Truncated {
                offset: self.offset(),
                needed: n,
                remaining: self.remaining(),
            })?;
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> ParseResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> ParseResult<u32> {
        self.array().map(u32::from_be_bytes)
    }

    fn f32(&mut self) -> ParseResult<f32> {
        self.array().map(f32::from_be_bytes)
    }

    fn f64(&mut self) -> ParseResult<f64> {
        self.array().map(f64::from_be_bytes)
    }
}

/// Decodes an opcode list, tagging every opcode with the default stage.
pub fn decode(bytes: &[u8]) -> ParseResult<Vec<Opcode>> {
    decode_stage(bytes, OpcodeStage::default())
}

/// Decodes an opcode list that was extracted from the given stage's tag.
#[instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
pub fn decode_stage(bytes: &[u8], stage: OpcodeStage) -> ParseResult<Vec<Opcode>> {
    let mut reader = ByteReader::new(bytes);
    let count = reader.u32()? as usize;

    // The count is untrusted; never reserve more than the blob could hold.
    let mut opcodes = Vec::with_capacity(count.min(reader.remaining() / RECORD_HEADER_LEN));
    for index in 0..count {
        opcodes.push(read_record(&mut reader, index, stage)?);
    }

    if reader.remaining() > 0 {
        warn!(
            trailing = reader.remaining(),
            "Ignoring bytes after the last opcode record"
        );
    }
    debug!(count, "Decoded opcode list");
    Ok(opcodes)
}

fn read_record(reader: &mut ByteReader<'_>, index: usize, stage: OpcodeStage) -> ParseResult<Opcode> {
    let code = reader.u32()?;
    let version = reader.u32()?;
    let flags = OpcodeFlags::from_bits(reader.u32()?);
    let length = reader.u32()? as usize;
    let payload_offset = reader.offset();
    let bytes = reader.take(length)?;

    if flags.reserved_bits() != 0 {
        warn!(
            index,
            code,
            flags = flags.bits(),
            "Opcode sets reserved flag bits; keeping them as read"
        );
    }

    let id = OpcodeId::from_code(code);
    let mut body = ByteReader::at(bytes, payload_offset);
    let payload = match id {
        OpcodeId::WarpRectilinear => OpcodePayload::WarpRectilinear(read_warp(&mut body, index)?),
        OpcodeId::FixVignetteRadial => {
            OpcodePayload::FixVignetteRadial(read_vignette(&mut body, index)?)
        }
        OpcodeId::TrimBounds => OpcodePayload::TrimBounds(read_trim(&mut body, index)?),
        OpcodeId::GainMap => OpcodePayload::GainMap(read_gain_map(&mut body, index)?),
        OpcodeId::Unknown(code) => {
            if !flags.is_skippable() {
                return Err(ParseError::UnsupportedRequiredOpcode { index, id: code });
            }
            debug!(index, code, length, "Retaining unknown optional opcode");
            OpcodePayload::Unknown(UnknownOpcode {
                code,
                data: bytes.to_vec(),
            })
        }
    };

    payload
        .validate()
        .map_err(|source| ParseError::InvalidParameter { index, id, source })?;

    Ok(Opcode {
        header: OpcodeHeader {
            version,
            flags,
            stage,
        },
        enabled: true,
        payload,
    })
}

fn expect_len(index: usize, id: OpcodeId, expected: usize, actual: usize) -> ParseResult<()> {
    if expected != actual {
        return Err(ParseError::InvalidLength {
            index,
            id,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Rejects payloads too short to hold the fixed fields that size the rest.
fn expect_at_least(index: usize, id: OpcodeId, minimum: usize, actual: usize) -> ParseResult<()> {
    if actual < minimum {
        return Err(ParseError::InvalidLength {
            index,
            id,
            expected: minimum,
            actual,
        });
    }
    Ok(())
}

fn read_warp(body: &mut ByteReader<'_>, index: usize) -> ParseResult<WarpRectilinear> {
    let id = OpcodeId::WarpRectilinear;
    let length = body.remaining();
    expect_at_least(index, id, WARP_FIXED_LEN, length)?;

    let plane_count = body.u32()? as usize;
    let expected = plane_count
        .checked_mul(WARP_PLANE_LEN)
        .and_then(|n| n.checked_add(WARP_FIXED_LEN))
        .unwrap_or(usize::MAX);
    expect_len(index, id, expected, length)?;

    let mut planes = Vec::with_capacity(plane_count);
    for _ in 0..plane_count {
        let radial = [body.f64()?, body.f64()?, body.f64()?, body.f64()?];
        let tangential = [body.f64()?, body.f64()?];
        planes.push(WarpPlane { radial, tangential });
    }
    Ok(WarpRectilinear {
        planes,
        center_x: body.f64()?,
        center_y: body.f64()?,
    })
}

fn read_vignette(body: &mut ByteReader<'_>, index: usize) -> ParseResult<FixVignetteRadial> {
    expect_len(index, OpcodeId::FixVignetteRadial, VIGNETTE_LEN, body.remaining())?;
    let mut k = [0.0; 5];
    for slot in &mut k {
        *slot = body.f64()?;
    }
    Ok(FixVignetteRadial {
        k,
        center_x: body.f64()?,
        center_y: body.f64()?,
    })
}

fn read_trim(body: &mut ByteReader<'_>, index: usize) -> ParseResult<TrimBounds> {
    expect_len(index, OpcodeId::TrimBounds, TRIM_LEN, body.remaining())?;
    Ok(TrimBounds {
        top: body.u32()?,
        left: body.u32()?,
        bottom: body.u32()?,
        right: body.u32()?,
    })
}

fn read_gain_map(body: &mut ByteReader<'_>, index: usize) -> ParseResult<GainMap> {
    let id = OpcodeId::GainMap;
    let length = body.remaining();
    expect_at_least(index, id, GAIN_MAP_HEADER_LEN, length)?;

    let mut map = GainMap {
        top: body.u32()?,
        left: body.u32()?,
        bottom: body.u32()?,
        right: body.u32()?,
        plane: body.u32()?,
        planes: body.u32()?,
        row_pitch: body.u32()?,
        col_pitch: body.u32()?,
        map_points_v: body.u32()?,
        map_points_h: body.u32()?,
        map_spacing_v: body.f64()?,
        map_spacing_h: body.f64()?,
        map_origin_v: body.f64()?,
        map_origin_h: body.f64()?,
        map_planes: body.u32()?,
        gains: Vec::new(),
    };

    let gain_count = map.expected_gain_count().unwrap_or(usize::MAX);
    let expected = gain_count
        .checked_mul(4)
        .and_then(|n| n.checked_add(GAIN_MAP_HEADER_LEN))
        .unwrap_or(usize::MAX);
    expect_len(index, id, expected, length)?;

    map.gains.reserve_exact(gain_count);
    for _ in 0..gain_count {
        map.gains.push(body.f32()?);
    }
    Ok(map)
}
