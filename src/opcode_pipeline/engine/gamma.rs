//! Power-curve transform applied around opcode execution.

use rayon::prelude::*;

use crate::opcode_pipeline::engine::buffer::WorkBuffer;
use crate::opcode_pipeline::raster::Raster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GammaDirection {
    /// `v' = (v / max)^gamma * max`
    Decode,
    /// `v' = (v / max)^(1 / gamma) * max`
    Encode,
}

/// A stateless per-sample gamma curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaCurve {
    exponent: f32,
    direction: GammaDirection,
}

impl GammaCurve {
    pub fn new(exponent: f32, direction: GammaDirection) -> Self {
        Self {
            exponent,
            direction,
        }
    }

    pub fn decode(exponent: f32) -> Self {
        Self::new(exponent, GammaDirection::Decode)
    }

    pub fn encode(exponent: f32) -> Self {
        Self::new(exponent, GammaDirection::Encode)
    }

    /// A curve is only usable with a positive, finite exponent.
    pub fn is_valid(&self) -> bool {
        self.exponent.is_finite() && self.exponent > 0.0
    }

    fn power(&self) -> f32 {
        match self.direction {
            GammaDirection::Decode => self.exponent,
            GammaDirection::Encode => self.exponent.recip(),
        }
    }

    /// Maps one sample, clamping the result into `[0, max_value]`.
    pub fn map(&self, value: f32, max_value: f32) -> f32 {
        if max_value <= 0.0 {
            return 0.0;
        }
        let normalized = (value / max_value).clamp(0.0, 1.0);
        (normalized.powf(self.power()) * max_value).clamp(0.0, max_value)
    }

    /// Applies the curve to a 16-bit raster, producing a new raster.
    pub fn apply(&self, raster: &Raster) -> Raster {
        let max = f32::from(raster.max_value());
        let lut: Vec<u16> = (0..=raster.max_value())
            .map(|v| self.map(f32::from(v), max).round() as u16)
            .collect();

        let mut out = raster.clone();
        let row_len = out.row_len();
        out.data_mut().par_chunks_mut(row_len).for_each(|row| {
            for sample in row {
                // Samples above the declared depth saturate.
                *sample = lut[usize::from(*sample).min(lut.len() - 1)];
            }
        });
        out
    }

    pub(crate) fn apply_buffer(&self, buffer: &mut WorkBuffer) {
        let max = buffer.max_value;
        let row_len = buffer.row_len();
        buffer.data.par_chunks_mut(row_len).for_each(|row| {
            for sample in row {
                *sample = self.map(*sample, max);
            }
        });
    }
}
