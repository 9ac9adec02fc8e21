use crate::buffers::extract::{self, PassSource};
use crate::buffers::params::BufferParams;
use crate::device::memory::{DeviceMemory, HostMemory};
use crate::film::passes::{DenoisingFeature, PassType, ResolvedAov, ResolvedPass};
use crate::foundation::error::{LumenError, LumenResult};

/// Accumulation buffer for one tile: `width * height * pass_stride` floats on a device.
///
/// Kernels add raw sample values into the device array. Extraction reads the host copy, so
/// callers synchronize with [`RenderBuffers::copy_from_device`] before any `get_*_rect`.
///
/// Extraction calls share `&self` and may run concurrently on independent outputs.
/// [`RenderBuffers::reset`] takes `&mut self`, so it cannot overlap them.
pub struct RenderBuffers<M: DeviceMemory<f32> = HostMemory<f32>> {
    params: BufferParams,
    buffer: M,
}

impl RenderBuffers<HostMemory<f32>> {
    /// Buffers backed by process memory.
    pub fn new_host() -> Self {
        Self::new(HostMemory::new("RenderBuffers"))
    }
}

impl<M: DeviceMemory<f32>> RenderBuffers<M> {
    /// Wrap unallocated device memory. Call [`RenderBuffers::reset`] before use.
    pub fn new(buffer: M) -> Self {
        Self {
            params: BufferParams::default(),
            buffer,
        }
    }

    /// Current geometry and layout.
    pub fn params(&self) -> &BufferParams {
        &self.params
    }

    /// Underlying device memory.
    pub fn buffer(&self) -> &M {
        &self.buffer
    }

    /// Underlying device memory, e.g. for accumulation kernels.
    pub fn buffer_mut(&mut self) -> &mut M {
        &mut self.buffer
    }

    /// Adopt `params`, reallocate storage to fit and zero it.
    ///
    /// This discards every accumulated sample; callers skip it unless
    /// [`BufferParams::modified`] reports a change.
    ///
    /// On failure the buffers are left unallocated with default params.
    #[tracing::instrument(
        skip_all,
        fields(width = params.width, height = params.height, stride = params.passes.size())
    )]
    pub fn reset(&mut self, params: &BufferParams) -> LumenResult<()> {
        let allocated = params
            .pixel_count()
            .checked_mul(params.passes.size())
            .ok_or_else(|| {
                LumenError::device(format!(
                    "render buffer of {}x{} pixels with stride {} overflows",
                    params.width,
                    params.height,
                    params.passes.size()
                ))
            })
            .and_then(|len| {
                self.buffer.alloc(len)?;
                self.buffer.zero()?;
                Ok(len)
            });
        let len = match allocated {
            Ok(len) => len,
            Err(err) => {
                self.buffer.free();
                self.params = BufferParams::default();
                return Err(err);
            }
        };
        self.params = params.clone();
        tracing::debug!(len, "render buffers reallocated");
        Ok(())
    }

    /// Zero accumulated data at unchanged geometry.
    pub fn zero(&mut self) -> LumenResult<()> {
        self.buffer.zero()
    }

    /// Make device accumulation visible to extraction.
    ///
    /// Returns `Ok(false)` without copying when no storage has been allocated yet.
    pub fn copy_from_device(&mut self) -> LumenResult<bool> {
        if !self.buffer.is_allocated() {
            return Ok(false);
        }
        let row_elems = self.params.width as usize * self.params.passes.size();
        self.buffer
            .copy_to_host(0, row_elems, self.params.height as usize)?;
        Ok(true)
    }

    fn source(&self) -> PassSource<'_> {
        PassSource {
            data: self.buffer.host(),
            stride: self.params.passes.size(),
            pixels: self.params.pixel_count(),
        }
    }

    /// Decode pass `kind` into `pixels` (`components` floats per pixel, row-major).
    ///
    /// Returns `false` when the pass, or a companion it is normalized by, is not enabled.
    ///
    /// # Panics
    ///
    /// When `components` does not fit the pass arity (1 for scalar passes, 3 or 4 for
    /// four-wide passes), when `sample` is 0 for a filtered pass, or when `pixels` is short.
    pub fn get_pass_rect(
        &self,
        kind: PassType,
        exposure: f32,
        sample: u32,
        components: usize,
        pixels: &mut [f32],
    ) -> bool {
        let Some(resolved) = self.params.passes.get_pass(kind) else {
            return false;
        };
        self.get_resolved_pass_rect(&resolved, exposure, sample, components, pixels)
    }

    /// [`RenderBuffers::get_pass_rect`] with a descriptor resolved once via
    /// [`crate::PassLayout::get_pass`] on this buffer's layout.
    pub fn get_resolved_pass_rect(
        &self,
        resolved: &ResolvedPass,
        exposure: f32,
        sample: u32,
        components: usize,
        pixels: &mut [f32],
    ) -> bool {
        extract::pass_rect(self.source(), resolved, exposure, sample, components, pixels)
    }

    /// Decode a denoising feature or variance statistic.
    ///
    /// Returns `false` when denoising data is not stored, when `feature` is the clean pass
    /// but no clean pass is stored, or when `components` is not 1 or 3.
    pub fn get_denoising_pass_rect(
        &self,
        feature: DenoisingFeature,
        exposure: f32,
        sample: u32,
        components: usize,
        pixels: &mut [f32],
    ) -> bool {
        let Some(block_offset) = self.params.passes.denoising_offset() else {
            return false;
        };
        if feature == DenoisingFeature::Clean && self.params.passes.denoising_clean() != Some(true)
        {
            return false;
        }
        extract::denoising_rect(
            self.source(),
            block_offset,
            feature,
            exposure,
            sample,
            components,
            pixels,
        )
    }

    /// Decode the AOV called `name`. Returns `false` when no such AOV exists.
    ///
    /// # Panics
    ///
    /// When `components` does not match the AOV type (1 float, 3 color, 4 cryptomatte).
    pub fn get_aov_rect(
        &self,
        name: &str,
        exposure: f32,
        sample: u32,
        components: usize,
        pixels: &mut [f32],
    ) -> bool {
        let Some(resolved) = self.params.passes.get_aov(name) else {
            return false;
        };
        self.get_resolved_aov_rect(&resolved, exposure, sample, components, pixels)
    }

    /// [`RenderBuffers::get_aov_rect`] with a pre-resolved descriptor.
    pub fn get_resolved_aov_rect(
        &self,
        resolved: &ResolvedAov,
        exposure: f32,
        sample: u32,
        components: usize,
        pixels: &mut [f32],
    ) -> bool {
        extract::aov_rect(self.source(), resolved, exposure, sample, components, pixels)
    }
}

impl<M: DeviceMemory<f32>> Drop for RenderBuffers<M> {
    fn drop(&mut self) {
        self.buffer.free();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/buffers/render.rs"]
mod tests;
