use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::buffers::params::BufferParams;
use crate::film::passes::{Aov, PassLayout, PassType};
use crate::foundation::error::{LumenError, LumenResult};

/// JSON description of a pass layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Enabled passes; order does not matter.
    #[serde(default)]
    pub passes: Vec<PassType>,
    /// Named AOVs in layout order.
    #[serde(default)]
    pub aovs: Vec<Aov>,
    /// Denoising block, absent when denoising is off.
    #[serde(default)]
    pub denoising: Option<DenoisingConfig>,
}

/// Denoising block options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DenoisingConfig {
    /// Also store the clean pass.
    #[serde(default)]
    pub store_clean: bool,
}

impl LayoutConfig {
    /// Build the layout, rejecting duplicate AOV names.
    pub fn build(&self) -> LumenResult<PassLayout> {
        let mut layout = PassLayout::with_passes(self.passes.iter().copied());
        for aov in &self.aovs {
            layout.add_aov(aov.name.clone(), aov.kind)?;
        }
        if let Some(d) = self.denoising {
            layout.enable_denoising(d.store_clean);
        }
        Ok(layout)
    }
}

/// JSON description of a render buffer: tile geometry plus pass layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BufferConfig {
    /// Tile width in pixels.
    pub width: u32,
    /// Tile height in pixels.
    pub height: u32,
    /// Tile x position in the full frame.
    #[serde(default)]
    pub full_x: i32,
    /// Tile y position in the full frame.
    #[serde(default)]
    pub full_y: i32,
    /// Full frame width; defaults to `full_x + width`.
    #[serde(default)]
    pub full_width: Option<u32>,
    /// Full frame height; defaults to `full_y + height`.
    #[serde(default)]
    pub full_height: Option<u32>,
    /// Pass layout.
    pub layout: LayoutConfig,
}

impl BufferConfig {
    /// Parse a buffer config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> LumenResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| LumenError::serde(format!("parse buffer config JSON: {e}")))
    }

    /// Parse a buffer config from a JSON file on disk.
    #[tracing::instrument]
    pub fn from_path(path: &Path) -> LumenResult<Self> {
        let f = File::open(path).map_err(|e| {
            LumenError::validation(format!("open buffer config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate geometry and build [`BufferParams`].
    pub fn to_params(&self) -> LumenResult<BufferParams> {
        if self.width == 0 || self.height == 0 {
            return Err(LumenError::validation(format!(
                "tile size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.full_x < 0 || self.full_y < 0 {
            return Err(LumenError::validation(
                "tile position must be inside the full frame",
            ));
        }
        let extent = |origin: i32, size: u32| {
            (origin as u32).checked_add(size).ok_or_else(|| {
                LumenError::validation(format!(
                    "tile {}x{} at ({}, {}) exceeds the largest frame",
                    self.width, self.height, self.full_x, self.full_y
                ))
            })
        };
        let full_width = match self.full_width {
            Some(w) => w,
            None => extent(self.full_x, self.width)?,
        };
        let full_height = match self.full_height {
            Some(h) => h,
            None => extent(self.full_y, self.height)?,
        };
        if self.full_x as u64 + self.width as u64 > full_width as u64
            || self.full_y as u64 + self.height as u64 > full_height as u64
        {
            return Err(LumenError::validation(format!(
                "tile {}x{} at ({}, {}) does not fit in {}x{} frame",
                self.width, self.height, self.full_x, self.full_y, full_width, full_height
            )));
        }

        Ok(BufferParams {
            width: self.width,
            height: self.height,
            full_x: self.full_x,
            full_y: self.full_y,
            full_width,
            full_height,
            passes: self.layout.build()?,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/film/config.rs"]
mod tests;
