//! Opcode data types

use std::fmt;
use std::ops::BitOr;

/// Version stamp written for opcodes created in the editor (DNG 1.3.0.0).
pub const DNG_VERSION_1_3: u32 = 0x0103_0000;

/// Numeric opcode identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeId {
    WarpRectilinear,
    FixVignetteRadial,
    TrimBounds,
    GainMap,
    Unknown(u32),
}

impl OpcodeId {
    pub const fn code(self) -> u32 {
        match self {
            OpcodeId::WarpRectilinear => 1,
            OpcodeId::FixVignetteRadial => 3,
            OpcodeId::TrimBounds => 6,
            OpcodeId::GainMap => 9,
            OpcodeId::Unknown(code) => code,
        }
    }

    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => OpcodeId::WarpRectilinear,
            3 => OpcodeId::FixVignetteRadial,
            6 => OpcodeId::TrimBounds,
            9 => OpcodeId::GainMap,
            other => OpcodeId::Unknown(other),
        }
    }
}

impl fmt::Display for OpcodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpcodeId::WarpRectilinear => f.write_str("WarpRectilinear"),
            OpcodeId::FixVignetteRadial => f.write_str("FixVignetteRadial"),
            OpcodeId::TrimBounds => f.write_str("TrimBounds"),
            OpcodeId::GainMap => f.write_str("GainMap"),
            OpcodeId::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

/// The flags word of an opcode record.
///
/// Only the two low bits carry meaning. The remaining bits are reserved but
/// kept as read so that an encoded list reproduces its input exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OpcodeFlags(u32);

impl OpcodeFlags {
    pub const OPTIONAL: Self = Self(0b01);
    pub const SKIPPABLE_ON_UNKNOWN: Self = Self(0b10);
    const DEFINED: u32 = 0b11;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// An opcode a reader may drop when it does not understand it.
    pub const fn is_skippable(self) -> bool {
        self.0 & Self::DEFINED != 0
    }

    pub const fn reserved_bits(self) -> u32 {
        self.0 & !Self::DEFINED
    }
}

impl BitOr for OpcodeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Which of the three opcode lists an opcode belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpcodeStage {
    /// OpcodeList1: applied to the data as read from the file.
    Raw = 1,
    /// OpcodeList2: applied after mapping to linear reference values.
    #[default]
    Linear = 2,
    /// OpcodeList3: applied after demosaicing.
    Demosaiced = 3,
}

impl OpcodeStage {
    pub const ALL: [OpcodeStage; 3] = [OpcodeStage::Raw, OpcodeStage::Linear, OpcodeStage::Demosaiced];

    pub const fn index(self) -> u32 {
        self as u32
    }

    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(OpcodeStage::Raw),
            2 => Some(OpcodeStage::Linear),
            3 => Some(OpcodeStage::Demosaiced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeHeader {
    pub version: u32,
    pub flags: OpcodeFlags,
    pub stage: OpcodeStage,
}

impl Default for OpcodeHeader {
    fn default() -> Self {
        Self {
            version: DNG_VERSION_1_3,
            flags: OpcodeFlags::empty(),
            stage: OpcodeStage::default(),
        }
    }
}

/// Radial and tangential coefficients for one image plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpPlane {
    /// kr0..kr3
    pub radial: [f64; 4],
    /// kt0, kt1
    pub tangential: [f64; 2],
}

impl WarpPlane {
    pub const NEUTRAL: WarpPlane = WarpPlane {
        radial: [1.0, 0.0, 0.0, 0.0],
        tangential: [0.0, 0.0],
    };

    /// True for the neutral set and for a plane with every coefficient zero.
    pub fn is_identity(&self) -> bool {
        let tail_zero = self.radial[1..].iter().all(|&k| k == 0.0)
            && self.tangential.iter().all(|&k| k == 0.0);
        tail_zero && (self.radial[0] == 1.0 || self.radial[0] == 0.0)
    }

    /// kr0 is zero but another term is not. Near the centre such a plane maps
    /// every position onto the optical centre.
    pub fn is_degenerate(&self) -> bool {
        self.radial[0] == 0.0 && !self.is_identity()
    }
}

impl Default for WarpPlane {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarpRectilinear {
    pub planes: Vec<WarpPlane>,
    pub center_x: f64,
    pub center_y: f64,
}

impl Default for WarpRectilinear {
    fn default() -> Self {
        Self {
            planes: vec![WarpPlane::NEUTRAL],
            center_x: 0.5,
            center_y: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixVignetteRadial {
    /// Gain coefficients for r², r⁴, r⁶, r⁸ and r¹⁰.
    pub k: [f64; 5],
    pub center_x: f64,
    pub center_y: f64,
}

impl Default for FixVignetteRadial {
    fn default() -> Self {
        Self {
            k: [0.0; 5],
            center_x: 0.5,
            center_y: 0.5,
        }
    }
}

/// Crop rectangle; `bottom` and `right` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimBounds {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl TrimBounds {
    pub fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn full_frame(width: u32, height: u32) -> Self {
        Self::new(0, 0, height, width)
    }
}

/// Coarse grid of multiplicative gains interpolated over a rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct GainMap {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
    pub plane: u32,
    pub planes: u32,
    pub row_pitch: u32,
    pub col_pitch: u32,
    pub map_points_v: u32,
    pub map_points_h: u32,
    pub map_spacing_v: f64,
    pub map_spacing_h: f64,
    pub map_origin_v: f64,
    pub map_origin_h: f64,
    pub map_planes: u32,
    /// Row-major, map planes interleaved innermost.
    pub gains: Vec<f32>,
}

impl GainMap {
    /// A map spanning the whole image with every node set to `gain`.
    pub fn uniform(bounds: TrimBounds, points_v: u32, points_h: u32, gain: f32) -> Self {
        let spacing = |points: u32| {
            if points > 1 {
                1.0 / f64::from(points - 1)
            } else {
                0.0
            }
        };
        Self {
            top: bounds.top,
            left: bounds.left,
            bottom: bounds.bottom,
            right: bounds.right,
            plane: 0,
            planes: 1,
            row_pitch: 1,
            col_pitch: 1,
            map_points_v: points_v,
            map_points_h: points_h,
            map_spacing_v: spacing(points_v),
            map_spacing_h: spacing(points_h),
            map_origin_v: 0.0,
            map_origin_h: 0.0,
            map_planes: 1,
            gains: vec![gain; points_v as usize * points_h as usize],
        }
    }

    /// Number of gains the grid dimensions call for, `None` on overflow.
    pub fn expected_gain_count(&self) -> Option<usize> {
        (self.map_points_v as usize)
            .checked_mul(self.map_points_h as usize)?
            .checked_mul(self.map_planes as usize)
    }

    pub fn gain_at(&self, v: usize, h: usize, map_plane: usize) -> f32 {
        let index = (v * self.map_points_h as usize + h) * self.map_planes as usize + map_plane;
        self.gains[index]
    }
}

/// An opcode this crate does not interpret, kept byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOpcode {
    pub code: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpcodePayload {
    WarpRectilinear(WarpRectilinear),
    FixVignetteRadial(FixVignetteRadial),
    TrimBounds(TrimBounds),
    GainMap(GainMap),
    Unknown(UnknownOpcode),
}

impl OpcodePayload {
    pub fn id(&self) -> OpcodeId {
        match self {
            OpcodePayload::WarpRectilinear(_) => OpcodeId::WarpRectilinear,
            OpcodePayload::FixVignetteRadial(_) => OpcodeId::FixVignetteRadial,
            OpcodePayload::TrimBounds(_) => OpcodeId::TrimBounds,
            OpcodePayload::GainMap(_) => OpcodeId::GainMap,
            OpcodePayload::Unknown(unknown) => OpcodeId::Unknown(unknown.code),
        }
    }
}

/// One entry of an opcode list.
///
/// The identifier is carried by the payload variant, so the two can never
/// disagree. `enabled` is an editing toggle and is not part of the wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct Opcode {
    pub header: OpcodeHeader,
    pub enabled: bool,
    pub payload: OpcodePayload,
}

impl Opcode {
    pub fn new(payload: OpcodePayload) -> Self {
        Self {
            header: OpcodeHeader::default(),
            enabled: true,
            payload,
        }
    }

    /// A fresh opcode of the given kind with neutral parameters.
    ///
    /// Frame-dependent kinds use `width` x `height` for their rectangle.
    /// Unknown ids produce an empty optional blob.
    pub fn with_defaults(id: OpcodeId, width: u32, height: u32) -> Self {
        let frame = TrimBounds::full_frame(width, height);
        let payload = match id {
            OpcodeId::WarpRectilinear => OpcodePayload::WarpRectilinear(WarpRectilinear::default()),
            OpcodeId::FixVignetteRadial => {
                OpcodePayload::FixVignetteRadial(FixVignetteRadial::default())
            }
            OpcodeId::TrimBounds => OpcodePayload::TrimBounds(frame),
            OpcodeId::GainMap => OpcodePayload::GainMap(GainMap::uniform(frame, 2, 2, 1.0)),
            OpcodeId::Unknown(code) => {
                let opcode = Self::new(OpcodePayload::Unknown(UnknownOpcode {
                    code,
                    data: Vec::new(),
                }));
                return opcode.with_flags(OpcodeFlags::OPTIONAL);
            }
        };
        Self::new(payload)
    }

    pub fn with_stage(mut self, stage: OpcodeStage) -> Self {
        self.header.stage = stage;
        self
    }

    pub fn with_flags(mut self, flags: OpcodeFlags) -> Self {
        self.header.flags = flags;
        self
    }

    pub fn id(&self) -> OpcodeId {
        self.payload.id()
    }
}

impl From<WarpRectilinear> for Opcode {
    fn from(payload: WarpRectilinear) -> Self {
        Opcode::new(OpcodePayload::WarpRectilinear(payload))
    }
}

impl From<FixVignetteRadial> for Opcode {
    fn from(payload: FixVignetteRadial) -> Self {
        Opcode::new(OpcodePayload::FixVignetteRadial(payload))
    }
}

impl From<TrimBounds> for Opcode {
    fn from(payload: TrimBounds) -> Self {
        Opcode::new(OpcodePayload::TrimBounds(payload))
    }
}

impl From<GainMap> for Opcode {
    fn from(payload: GainMap) -> Self {
        Opcode::new(OpcodePayload::GainMap(payload))
    }
}

/// Opcodes tagged with `stage`, in list order.
pub fn for_stage(opcodes: &[Opcode], stage: OpcodeStage) -> Vec<Opcode> {
    opcodes
        .iter()
        .filter(|op| op.header.stage == stage)
        .cloned()
        .collect()
}
