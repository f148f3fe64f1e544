use crate::opcode_pipeline::common::error::OpcodeValidationError;
use crate::opcode_pipeline::opcodes::types::{
    FixVignetteRadial, GainMap, Opcode, OpcodePayload, TrimBounds, WarpRectilinear,
};

type Validation = Result<(), OpcodeValidationError>;

fn finite(value: f64, field: &'static str) -> Validation {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OpcodeValidationError::NonFinite { field })
    }
}

fn center(cx: f64, cy: f64) -> Validation {
    finite(cx, "center_x")?;
    finite(cy, "center_y")?;
    if !(0.0..=1.0).contains(&cx) || !(0.0..=1.0).contains(&cy) {
        return Err(OpcodeValidationError::CenterOutOfRange { cx, cy });
    }
    Ok(())
}

fn rectangle(top: u32, left: u32, bottom: u32, right: u32) -> Validation {
    if top >= bottom || left >= right {
        return Err(OpcodeValidationError::EmptyRectangle {
            top,
            left,
            bottom,
            right,
        });
    }
    Ok(())
}

impl WarpRectilinear {
    pub fn validate(&self) -> Validation {
        if self.planes.is_empty() {
            return Err(OpcodeValidationError::ZeroPlanes);
        }
        for plane in &self.planes {
            for &k in plane.radial.iter().chain(plane.tangential.iter()) {
                finite(k, "warp coefficient")?;
            }
        }
        center(self.center_x, self.center_y)
    }
}

impl FixVignetteRadial {
    pub fn validate(&self) -> Validation {
        for &k in &self.k {
            finite(k, "vignette coefficient")?;
        }
        center(self.center_x, self.center_y)
    }
}

impl TrimBounds {
    pub fn validate(&self) -> Validation {
        rectangle(self.top, self.left, self.bottom, self.right)
    }
}

impl GainMap {
    pub fn validate(&self) -> Validation {
        rectangle(self.top, self.left, self.bottom, self.right)?;
        if self.planes == 0 {
            return Err(OpcodeValidationError::ZeroPlanes);
        }
        if self.row_pitch == 0 || self.col_pitch == 0 {
            return Err(OpcodeValidationError::ZeroPitch);
        }
        if self.map_points_v == 0 || self.map_points_h == 0 || self.map_planes == 0 {
            return Err(OpcodeValidationError::EmptyGrid);
        }
        finite(self.map_spacing_v, "map_spacing_v")?;
        finite(self.map_spacing_h, "map_spacing_h")?;
        finite(self.map_origin_v, "map_origin_v")?;
        finite(self.map_origin_h, "map_origin_h")?;

        let expected = self
            .expected_gain_count()
            .ok_or(OpcodeValidationError::GridLength {
                expected: usize::MAX,
                actual: self.gains.len(),
            })?;
        if self.gains.len() != expected {
            return Err(OpcodeValidationError::GridLength {
                expected,
                actual: self.gains.len(),
            });
        }
        if self.gains.iter().any(|g| !g.is_finite()) {
            return Err(OpcodeValidationError::NonFinite { field: "gain" });
        }
        Ok(())
    }
}

impl OpcodePayload {
    pub fn validate(&self) -> Validation {
        match self {
            OpcodePayload::WarpRectilinear(warp) => warp.validate(),
            OpcodePayload::FixVignetteRadial(vignette) => vignette.validate(),
            OpcodePayload::TrimBounds(trim) => trim.validate(),
            OpcodePayload::GainMap(map) => map.validate(),
            OpcodePayload::Unknown(_) => Ok(()),
        }
    }
}

impl Opcode {
    /// Checks the parameters the execution engine relies on.
    pub fn validate(&self) -> Validation {
        self.payload.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode_pipeline::opcodes::types::{OpcodeId, WarpPlane};

    #[test]
    fn test_defaults_are_valid() {
        for id in [
            OpcodeId::WarpRectilinear,
            OpcodeId::FixVignetteRadial,
            OpcodeId::TrimBounds,
            OpcodeId::GainMap,
            OpcodeId::Unknown(42),
        ] {
            assert_eq!(Opcode::with_defaults(id, 64, 48).validate(), Ok(()), "{id}");
        }
    }

    #[test]
    fn test_warp_without_planes_rejected() {
        let warp = WarpRectilinear {
            planes: vec![],
            ..WarpRectilinear::default()
        };
        assert_eq!(warp.validate(), Err(OpcodeValidationError::ZeroPlanes));
    }

    #[test]
    fn test_center_outside_unit_square_rejected() {
        let warp = WarpRectilinear {
            planes: vec![WarpPlane::NEUTRAL],
            center_x: 1.5,
            center_y: 0.5,
        };
        assert!(matches!(
            warp.validate(),
            Err(OpcodeValidationError::CenterOutOfRange { .. })
        ));
    }

    #[test]
    fn test_zero_area_trim_rejected() {
        assert!(matches!(
            TrimBounds::new(4, 0, 4, 10).validate(),
            Err(OpcodeValidationError::EmptyRectangle { .. })
        ));
    }

    #[test]
    fn test_gain_grid_length_checked() {
        let mut map = GainMap::uniform(TrimBounds::full_frame(8, 8), 3, 3, 1.0);
        map.gains.pop();
        assert_eq!(
            map.validate(),
            Err(OpcodeValidationError::GridLength {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn test_nan_gain_rejected() {
        let mut map = GainMap::uniform(TrimBounds::full_frame(8, 8), 2, 2, 1.0);
        map.gains[3] = f32::NAN;
        assert_eq!(
            map.validate(),
            Err(OpcodeValidationError::NonFinite { field: "gain" })
        );
    }
}
