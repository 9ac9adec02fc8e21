use crate::film::passes::PassLayout;

/// Geometry and pass layout of one render buffer tile.
///
/// `(full_x, full_y)` places the `width x height` tile inside a `full_width x full_height`
/// frame. Pixel data is `width * height * passes.size()` floats.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferParams {
    /// Tile width in pixels.
    pub width: u32,
    /// Tile height in pixels.
    pub height: u32,
    /// Tile x position in the full frame.
    pub full_x: i32,
    /// Tile y position in the full frame.
    pub full_y: i32,
    /// Full frame width.
    pub full_width: u32,
    /// Full frame height.
    pub full_height: u32,
    /// Enabled passes; `passes.size()` is the pixel stride.
    pub passes: PassLayout,
}

impl BufferParams {
    /// Offset and row stride addressing this tile in full-frame coordinates.
    ///
    /// For `(x, y)` inside the tile, `offset + y * stride + x` is the tile-local pixel index.
    pub fn get_offset_stride(&self) -> (i64, i64) {
        let width = i64::from(self.width);
        let offset = -(i64::from(self.full_x) + i64::from(self.full_y) * width);
        (offset, width)
    }

    /// Tile-local pixel index of full-frame pixel `(x, y)`, `None` outside the tile.
    pub fn pixel_index(&self, x: i32, y: i32) -> Option<usize> {
        let inside_x =
            x >= self.full_x && i64::from(x) < i64::from(self.full_x) + i64::from(self.width);
        let inside_y =
            y >= self.full_y && i64::from(y) < i64::from(self.full_y) + i64::from(self.height);
        if !(inside_x && inside_y) {
            return None;
        }
        let (offset, stride) = self.get_offset_stride();
        Some((offset + i64::from(y) * stride + i64::from(x)) as usize)
    }

    /// Number of pixels in the tile.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether storage allocated for `other` cannot be reused for `self`.
    ///
    /// Reallocation discards accumulated samples, so this is the only trigger callers use.
    pub fn modified(&self, other: &BufferParams) -> bool {
        self != other
    }
}

/// Sample range and addressing handed to the workers rendering one tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderTile {
    /// Tile x position in the full frame.
    pub x: i32,
    /// Tile y position in the full frame.
    pub y: i32,
    /// Tile width.
    pub w: u32,
    /// Tile height.
    pub h: u32,
    /// First sample of this pass over the tile.
    pub start_sample: u32,
    /// Samples to take in this pass.
    pub num_samples: u32,
    /// Next sample to take.
    pub sample: u32,
    /// Pixel size divider for preview passes, `1` at full resolution.
    pub resolution: u32,
    /// See [`BufferParams::get_offset_stride`].
    pub offset: i64,
    /// See [`BufferParams::get_offset_stride`].
    pub stride: i64,
}

impl RenderTile {
    /// Describe rendering `num_samples` samples from `start_sample` into `params`.
    pub fn from_params(params: &BufferParams, start_sample: u32, num_samples: u32) -> Self {
        let (offset, stride) = params.get_offset_stride();
        Self {
            x: params.full_x,
            y: params.full_y,
            w: params.width,
            h: params.height,
            start_sample,
            num_samples,
            sample: start_sample,
            resolution: 1,
            offset,
            stride,
        }
    }

    /// One past the last sample of this pass.
    pub fn end_sample(&self) -> u32 {
        self.start_sample.saturating_add(self.num_samples)
    }

    /// Tile-local index of full-frame pixel `(x, y)`. Only meaningful inside the tile.
    pub fn index(&self, x: i32, y: i32) -> i64 {
        self.offset + i64::from(y) * self.stride + i64::from(x)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/buffers/params.rs"]
mod tests;
