use tracing::debug;

use crate::opcode_pipeline::engine::buffer::WorkBuffer;
use crate::opcode_pipeline::opcodes::TrimBounds;

/// Crops to `[top, bottom) x [left, right)`, clamped to the current frame.
///
/// A rectangle that covers the frame, or that is empty once clamped, leaves
/// the buffer as it is.
pub(crate) fn trim_bounds(buffer: WorkBuffer, trim: &TrimBounds) -> WorkBuffer {
    let bottom = (trim.bottom as usize).min(buffer.height);
    let right = (trim.right as usize).min(buffer.width);
    let top = trim.top as usize;
    let left = trim.left as usize;

    if top >= bottom || left >= right {
        debug!(?trim, width = buffer.width, height = buffer.height, "Trim rectangle outside frame");
        return buffer;
    }
    if top == 0 && left == 0 && bottom == buffer.height && right == buffer.width {
        return buffer;
    }

    let channels = buffer.channels;
    let row_len = buffer.row_len();
    let width = right - left;
    let height = bottom - top;
    let mut data = Vec::with_capacity(width * height * channels);
    for row in buffer.data.chunks_exact(row_len).skip(top).take(height) {
        data.extend_from_slice(&row[left * channels..right * channels]);
    }

    WorkBuffer {
        width,
        height,
        data,
        ..buffer
    }
}
