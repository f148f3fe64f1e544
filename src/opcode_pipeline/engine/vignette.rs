use rayon::prelude::*;

use crate::opcode_pipeline::engine::buffer::{OpticalFrame, WorkBuffer};
use crate::opcode_pipeline::opcodes::FixVignetteRadial;

impl FixVignetteRadial {
    /// `1 + k0 r² + k1 r⁴ + k2 r⁶ + k3 r⁸ + k4 r¹⁰` for a squared radius.
    pub fn gain(&self, r2: f64) -> f64 {
        let [k0, k1, k2, k3, k4] = self.k;
        1.0 + r2 * (k0 + r2 * (k1 + r2 * (k2 + r2 * (k3 + r2 * k4))))
    }
}

pub(crate) fn fix_vignette_radial(mut buffer: WorkBuffer, vignette: &FixVignetteRadial) -> WorkBuffer {
    if vignette.k.iter().all(|&k| k == 0.0) {
        return buffer;
    }

    let frame = OpticalFrame::new(buffer.width, buffer.height, vignette.center_x, vignette.center_y);
    let channels = buffer.channels;
    let row_len = buffer.row_len();
    let max = f64::from(buffer.max_value);

    buffer
        .data
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, pixel) in row.chunks_exact_mut(channels).enumerate() {
                let gain = vignette.gain(frame.radius_squared(x, y));
                for sample in pixel {
                    *sample = (f64::from(*sample) * gain).clamp(0.0, max) as f32;
                }
            }
        });
    buffer
}
