use std::path::Path;

use half::f16;

use crate::buffers::params::BufferParams;
use crate::device::draw::{DisplayPixels, DrawRequest, DrawTarget};
use crate::device::memory::{DeviceMemory, HostMemory};
use crate::foundation::error::{LumenError, LumenResult};
use crate::foundation::strided::StridedView;

/// RGBA preview pixels for progressive display of one tile.
///
/// Storage format (8-bit or half-float) is fixed at construction. `draw_width` and
/// `draw_height` track how much of the tile currently holds valid pixels.
pub struct DisplayBuffer<B = HostMemory<[u8; 4]>, H = HostMemory<[f16; 4]>>
where
    B: DeviceMemory<[u8; 4]>,
    H: DeviceMemory<[f16; 4]>,
{
    params: BufferParams,
    draw_width: u32,
    draw_height: u32,
    transparent: bool,
    half_float: bool,
    rgba_byte: B,
    rgba_half: H,
}

impl DisplayBuffer {
    /// Display buffer backed by process memory.
    pub fn new_host(half_float: bool) -> Self {
        Self::new(
            HostMemory::new("display buffer byte"),
            HostMemory::new("display buffer half"),
            half_float,
        )
    }
}

impl<B, H> DisplayBuffer<B, H>
where
    B: DeviceMemory<[u8; 4]>,
    H: DeviceMemory<[f16; 4]>,
{
    /// Wrap unallocated device memory for both formats; only one is ever allocated.
    pub fn new(rgba_byte: B, rgba_half: H, half_float: bool) -> Self {
        Self {
            params: BufferParams::default(),
            draw_width: 0,
            draw_height: 0,
            transparent: true,
            half_float,
            rgba_byte,
            rgba_half,
        }
    }

    /// Current tile geometry.
    pub fn params(&self) -> &BufferParams {
        &self.params
    }

    /// Whether pixels are stored as half floats.
    pub fn is_half_float(&self) -> bool {
        self.half_float
    }

    /// Whether drawing blends over existing content.
    pub fn transparent(&self) -> bool {
        self.transparent
    }

    /// Set the blend flag passed to draw targets.
    pub fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    /// Valid region as `(width, height)`.
    pub fn draw_size(&self) -> (u32, u32) {
        (self.draw_width, self.draw_height)
    }

    /// 8-bit storage, the write target of display conversion kernels.
    pub fn rgba_byte_mut(&mut self) -> &mut B {
        &mut self.rgba_byte
    }

    /// Half-float storage, the write target of display conversion kernels.
    pub fn rgba_half_mut(&mut self) -> &mut H {
        &mut self.rgba_half
    }

    /// Reallocate storage for `params` and mark the whole tile invalid.
    #[tracing::instrument(
        skip_all,
        fields(width = params.width, height = params.height, half_float = self.half_float)
    )]
    pub fn reset(&mut self, params: &BufferParams) -> LumenResult<()> {
        self.draw_width = 0;
        self.draw_height = 0;

        let len = params.pixel_count();
        let allocated = if self.half_float {
            self.rgba_half.alloc(len)
        } else {
            self.rgba_byte.alloc(len)
        };
        if let Err(err) = allocated {
            self.params = BufferParams::default();
            return Err(err);
        }
        self.params = params.clone();
        Ok(())
    }

    /// Record that the top-left `width x height` region holds valid pixels.
    ///
    /// # Panics
    ///
    /// When the region exceeds the tile.
    pub fn draw_set(&mut self, width: u32, height: u32) {
        assert!(
            width <= self.params.width && height <= self.params.height,
            "draw region {width}x{height} exceeds tile {}x{}",
            self.params.width,
            self.params.height
        );
        self.draw_width = width;
        self.draw_height = height;
    }

    /// Whether a non-empty region is valid.
    pub fn draw_ready(&self) -> bool {
        self.draw_width != 0 && self.draw_height != 0
    }

    /// Hand the valid region to `target`. Does nothing until [`DisplayBuffer::draw_ready`].
    pub fn draw(&self, target: &mut impl DrawTarget) {
        if !self.draw_ready() {
            return;
        }
        let pixels = if self.half_float {
            DisplayPixels::Half(self.rgba_half.host())
        } else {
            DisplayPixels::Byte(self.rgba_byte.host())
        };
        target.draw_pixels(DrawRequest {
            pixels,
            draw_width: self.draw_width,
            draw_height: self.draw_height,
            full_x: self.params.full_x,
            full_y: self.params.full_y,
            width: self.params.width,
            height: self.params.height,
            transparent: self.transparent,
        });
    }

    /// Save the valid region as an 8-bit RGBA image, bottom row first.
    ///
    /// Half-float buffers and empty regions are skipped and report `Ok(false)`.
    pub fn write(&mut self, path: &Path) -> LumenResult<bool> {
        let (w, h) = (self.draw_width as usize, self.draw_height as usize);
        if w == 0 || h == 0 || self.half_float {
            return Ok(false);
        }

        self.rgba_byte.copy_to_host(0, w, h)?;
        let pixels = &self.rgba_byte.host()[..w * h];

        // Image rows are stored top to bottom, display rows bottom to top.
        let rows = StridedView::rows_bottom_up(pixels, w, h);
        let mut bytes = Vec::with_capacity(w * h * 4);
        for row in rows.iter() {
            bytes.extend(row.iter().flatten());
        }

        image::save_buffer(
            path,
            &bytes,
            self.draw_width,
            self.draw_height,
            image::ColorType::Rgba8,
        )
        .map_err(|e| LumenError::image(format!("write '{}': {e}", path.display())))?;
        tracing::debug!(path = %path.display(), w, h, "display buffer written");
        Ok(true)
    }
}

impl<B, H> Drop for DisplayBuffer<B, H>
where
    B: DeviceMemory<[u8; 4]>,
    H: DeviceMemory<[f16; 4]>,
{
    fn drop(&mut self) {
        self.rgba_byte.free();
        self.rgba_half.free();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/buffers/display.rs"]
mod tests;
