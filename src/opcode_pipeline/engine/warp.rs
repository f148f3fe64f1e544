use rayon::prelude::*;
use tracing::warn;

use crate::opcode_pipeline::engine::buffer::{OpticalFrame, WorkBuffer};
use crate::opcode_pipeline::opcodes::{WarpPlane, WarpRectilinear};

impl WarpPlane {
    /// Maps a normalised destination offset to a normalised source offset.
    fn source_offset(&self, dx: f64, dy: f64) -> (f64, f64) {
        let [kr0, kr1, kr2, kr3] = self.radial;
        let [kt0, kt1] = self.tangential;
        let r2 = dx * dx + dy * dy;
        let f = kr0 + r2 * (kr1 + r2 * (kr2 + r2 * kr3));
        let dxdy2 = 2.0 * dx * dy;
        let tx = kt0 * dxdy2 + kt1 * (r2 + 2.0 * dx * dx);
        let ty = kt1 * dxdy2 + kt0 * (r2 + 2.0 * dy * dy);
        (f * dx + tx, f * dy + ty)
    }
}

/// Resamples every channel through its plane's distortion polynomial.
///
/// Reads only from `input` and writes disjoint destination rows, so rows are
/// filled in parallel. Channel `c` uses plane `min(c, planes - 1)`.
///
/// An all-zero plane is treated as identity, but the polynomial itself is not
/// continuous there: with kr0 = 0 and any other term non-zero, every sample is
/// pulled to (nearly) the optical centre and the plane renders flat.
pub(crate) fn warp_rectilinear(input: WorkBuffer, warp: &WarpRectilinear) -> WorkBuffer {
    if warp.planes.iter().all(WarpPlane::is_identity) {
        return input;
    }
    if let Some(plane) = warp.planes.iter().position(WarpPlane::is_degenerate) {
        warn!(plane, "Warp plane has kr0 = 0 with non-zero terms and will collapse to the centre");
    }

    let frame = OpticalFrame::new(input.width, input.height, warp.center_x, warp.center_y);
    let plane_for = |channel: usize| &warp.planes[channel.min(warp.planes.len() - 1)];
    let channels = input.channels;
    let row_len = input.row_len();

    let mut output = input.clone();
    output
        .data
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = (y as f64 - frame.cy) / frame.radius;
            for (x, pixel) in row.chunks_exact_mut(channels).enumerate() {
                let dx = (x as f64 - frame.cx) / frame.radius;
                for (c, sample) in pixel.iter_mut().enumerate() {
                    let plane = plane_for(c);
                    if plane.is_identity() {
                        continue;
                    }
                    let (sx, sy) = plane.source_offset(dx, dy);
                    *sample = input.bilinear(
                        frame.cx + sx * frame.radius,
                        frame.cy + sy * frame.radius,
                        c,
                    );
                }
            }
        });
    output
}
