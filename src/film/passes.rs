use serde::{Deserialize, Serialize};

use crate::foundation::error::{LumenError, LumenResult};

/// Render pass kinds.
///
/// Declaration order is the tie-breaker of the canonical layout order, so `Combined` always
/// lands at offset `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassType {
    /// Beauty pass.
    Combined,
    /// Camera distance. A raw `0.0` means the camera ray hit nothing.
    Depth,
    /// Normalized mist factor.
    Mist,
    /// Shading normal.
    Normal,
    /// Texture coordinates.
    Uv,
    /// Screen-space motion vectors, normalized by [`PassType::MotionWeight`].
    Motion,
    /// Per-pixel count of samples that contributed motion.
    MotionWeight,
    /// Object index.
    ObjectId,
    /// Material index.
    MaterialId,
    /// Emitted light.
    Emission,
    /// World background.
    Background,
    /// Ambient occlusion.
    Ao,
    /// Shadow catcher data, `(rgb, w)` with `w` the normalization weight.
    Shadow,
    /// Diffuse albedo.
    DiffuseColor,
    /// Glossy albedo.
    GlossyColor,
    /// Transmission albedo.
    TransmissionColor,
    /// Subsurface albedo.
    SubsurfaceColor,
    /// Direct diffuse lighting.
    DiffuseDirect,
    /// Indirect diffuse lighting.
    DiffuseIndirect,
    /// Direct glossy lighting.
    GlossyDirect,
    /// Indirect glossy lighting.
    GlossyIndirect,
    /// Direct transmission lighting.
    TransmissionDirect,
    /// Indirect transmission lighting.
    TransmissionIndirect,
    /// Direct subsurface lighting.
    SubsurfaceDirect,
    /// Indirect subsurface lighting.
    SubsurfaceIndirect,
    /// Direct volume lighting.
    VolumeDirect,
    /// Indirect volume lighting.
    VolumeIndirect,
    /// Debug: BVH nodes visited.
    BvhTraversedNodes,
    /// Debug: BVH instances visited.
    BvhTraversedInstances,
    /// Debug: primitive intersection tests.
    BvhIntersections,
    /// Debug: path bounces.
    RayBounces,
}

impl PassType {
    /// All pass kinds in declaration order.
    pub const ALL: [PassType; 31] = [
        Self::Combined,
        Self::Depth,
        Self::Mist,
        Self::Normal,
        Self::Uv,
        Self::Motion,
        Self::MotionWeight,
        Self::ObjectId,
        Self::MaterialId,
        Self::Emission,
        Self::Background,
        Self::Ao,
        Self::Shadow,
        Self::DiffuseColor,
        Self::GlossyColor,
        Self::TransmissionColor,
        Self::SubsurfaceColor,
        Self::DiffuseDirect,
        Self::DiffuseIndirect,
        Self::GlossyDirect,
        Self::GlossyIndirect,
        Self::TransmissionDirect,
        Self::TransmissionIndirect,
        Self::SubsurfaceDirect,
        Self::SubsurfaceIndirect,
        Self::VolumeDirect,
        Self::VolumeIndirect,
        Self::BvhTraversedNodes,
        Self::BvhTraversedInstances,
        Self::BvhIntersections,
        Self::RayBounces,
    ];

    /// Debug counters are normalized by sample count but never exposure-scaled.
    pub fn is_debug(self) -> bool {
        matches!(
            self,
            Self::BvhTraversedNodes
                | Self::BvhTraversedInstances
                | Self::BvhIntersections
                | Self::RayBounces
        )
    }

    /// Pass descriptor with the default storage flags for this kind.
    pub fn descriptor(self) -> Pass {
        let mut pass = Pass {
            kind: self,
            components: 4,
            filter: true,
            exposure: false,
            divide: None,
        };
        match self {
            Self::Combined | Self::Emission | Self::Background => pass.exposure = true,
            Self::Depth | Self::Mist | Self::MotionWeight => pass.components = 1,
            Self::ObjectId | Self::MaterialId => {
                pass.components = 1;
                pass.filter = false;
            }
            Self::Motion => pass.filter = false,
            Self::DiffuseDirect | Self::DiffuseIndirect => {
                pass.exposure = true;
                pass.divide = Some(Self::DiffuseColor);
            }
            Self::GlossyDirect | Self::GlossyIndirect => {
                pass.exposure = true;
                pass.divide = Some(Self::GlossyColor);
            }
            Self::TransmissionDirect | Self::TransmissionIndirect => {
                pass.exposure = true;
                pass.divide = Some(Self::TransmissionColor);
            }
            Self::SubsurfaceDirect | Self::SubsurfaceIndirect => {
                pass.exposure = true;
                pass.divide = Some(Self::SubsurfaceColor);
            }
            Self::VolumeDirect | Self::VolumeIndirect => pass.exposure = true,
            Self::BvhTraversedNodes
            | Self::BvhTraversedInstances
            | Self::BvhIntersections
            | Self::RayBounces => pass.components = 1,
            Self::Normal
            | Self::Uv
            | Self::Ao
            | Self::Shadow
            | Self::DiffuseColor
            | Self::GlossyColor
            | Self::TransmissionColor
            | Self::SubsurfaceColor => {}
        }
        pass
    }
}

/// Storage descriptor of one enabled pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pass {
    /// Pass kind.
    pub kind: PassType,
    /// Floats per pixel (1 or 4).
    pub components: u32,
    /// Normalize by sample count on extraction.
    pub filter: bool,
    /// Multiply by film exposure on extraction.
    pub exposure: bool,
    /// Companion pass this lighting pass is divided by on extraction.
    pub divide: Option<PassType>,
}

/// AOV value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AovType {
    /// Single float.
    Float,
    /// RGB color, exposure-scaled on extraction.
    Rgb,
    /// Two `(id, weight)` cryptomatte layers.
    Cryptomatte,
}

impl AovType {
    /// Floats per pixel.
    pub fn components(self) -> u32 {
        match self {
            Self::Float => 1,
            Self::Rgb => 3,
            Self::Cryptomatte => 4,
        }
    }
}

/// A named auxiliary output variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aov {
    /// User-facing name, unique within a layout.
    pub name: String,
    /// Value type.
    pub kind: AovType,
}

/// Denoising features and statistics stored in the denoising block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenoisingFeature {
    /// Mean shading normal.
    Normal,
    /// `E[x^2]` of the shading normal.
    NormalVar,
    /// Mean albedo.
    Albedo,
    /// `E[x^2]` of the albedo.
    AlbedoVar,
    /// Mean depth.
    Depth,
    /// `E[x^2]` of the depth.
    DepthVar,
    /// First half-buffer of the shadow feature.
    ShadowA,
    /// Second half-buffer of the shadow feature.
    ShadowB,
    /// Noisy color.
    Color,
    /// `E[x^2]` of the noisy color.
    ColorVar,
    /// Color contributions excluded from denoising. Only present with a clean block.
    Clean,
}

/// Floats in the denoising block without the clean pass.
pub const DENOISING_BLOCK_SIZE: u32 = 26;
/// Extra floats of the optional clean pass.
pub const DENOISING_CLEAN_SIZE: u32 = 3;

impl DenoisingFeature {
    /// Offset inside the denoising block.
    pub fn offset(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::NormalVar => 3,
            Self::Albedo => 6,
            Self::AlbedoVar => 9,
            Self::Depth => 12,
            Self::DepthVar => 13,
            Self::ShadowA => 14,
            Self::ShadowB => 17,
            Self::Color => 20,
            Self::ColorVar => 23,
            Self::Clean => 26,
        }
    }

    /// Natural component count of the feature.
    pub fn components(self) -> u32 {
        match self {
            Self::Depth | Self::DepthVar => 1,
            _ => 3,
        }
    }

    /// Variance statistics are reconstructed from an `E[x^2]` slot and the mean before it.
    pub fn is_variance(self) -> bool {
        matches!(
            self,
            Self::NormalVar | Self::AlbedoVar | Self::DepthVar | Self::ColorVar
        )
    }
}

/// A pass descriptor resolved to its offset inside the pixel stride.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedPass {
    /// Descriptor.
    pub pass: Pass,
    /// Offset of the first component inside a pixel.
    pub offset: usize,
    /// Offset of the divide companion, when the pass has one and it is enabled.
    pub divide_offset: Option<usize>,
    /// Offset of the motion weight pass, when this is the motion pass and it is enabled.
    pub motion_weight_offset: Option<usize>,
}

/// An AOV resolved to its offset inside the pixel stride.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAov {
    /// Descriptor.
    pub aov: Aov,
    /// Offset of the first component inside a pixel.
    pub offset: usize,
}

/// Ordered set of enabled passes, AOVs and the optional denoising block.
///
/// Per-pixel layout: passes in canonical order, then AOVs in insertion order, then the
/// denoising block. [`PassLayout::size`] is the pixel stride of the render buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassLayout {
    passes: Vec<Pass>,
    aovs: Vec<Aov>,
    denoising: Option<bool>,
}

impl PassLayout {
    /// Empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout containing only the given passes with default flags.
    pub fn with_passes(kinds: impl IntoIterator<Item = PassType>) -> Self {
        let mut layout = Self::new();
        for kind in kinds {
            layout.add(kind);
        }
        layout
    }

    /// Enable a pass with its default flags. Adding an enabled pass again is a no-op.
    pub fn add(&mut self, kind: PassType) {
        self.add_pass(kind.descriptor());
    }

    /// Enable a pass with explicit flags. Adding an enabled kind again is a no-op.
    pub fn add_pass(&mut self, pass: Pass) {
        if self.passes.iter().any(|p| p.kind == pass.kind) {
            return;
        }
        let at = self
            .passes
            .iter()
            .position(|p| canonical_before(&pass, p))
            .unwrap_or(self.passes.len());
        self.passes.insert(at, pass);
    }

    /// Append a named AOV.
    pub fn add_aov(&mut self, name: impl Into<String>, kind: AovType) -> LumenResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(LumenError::validation("AOV name must not be empty"));
        }
        if self.aovs.iter().any(|a| a.name == name) {
            return Err(LumenError::validation(format!("duplicate AOV '{name}'")));
        }
        self.aovs.push(Aov { name, kind });
        Ok(())
    }

    /// Enable the denoising block, optionally with the clean pass.
    pub fn enable_denoising(&mut self, store_clean: bool) {
        self.denoising = Some(store_clean);
    }

    /// Enabled passes in layout order.
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// AOVs in layout order.
    pub fn aovs(&self) -> &[Aov] {
        &self.aovs
    }

    /// Whether the denoising block stores the clean pass. `None` when denoising is disabled.
    pub fn denoising_clean(&self) -> Option<bool> {
        self.denoising
    }

    fn passes_size(&self) -> usize {
        self.passes.iter().map(|p| p.components as usize).sum()
    }

    fn aovs_size(&self) -> usize {
        self.aovs.iter().map(|a| a.kind.components() as usize).sum()
    }

    fn denoising_size(&self) -> usize {
        match self.denoising {
            None => 0,
            Some(false) => DENOISING_BLOCK_SIZE as usize,
            Some(true) => (DENOISING_BLOCK_SIZE + DENOISING_CLEAN_SIZE) as usize,
        }
    }

    /// Floats per pixel.
    pub fn size(&self) -> usize {
        self.passes_size() + self.aovs_size() + self.denoising_size()
    }

    fn pass_offset(&self, kind: PassType) -> Option<(Pass, usize)> {
        let mut offset = 0;
        for p in &self.passes {
            if p.kind == kind {
                return Some((*p, offset));
            }
            offset += p.components as usize;
        }
        None
    }

    /// Resolve a pass and its companions. `None` when the pass is not enabled.
    pub fn get_pass(&self, kind: PassType) -> Option<ResolvedPass> {
        let (pass, offset) = self.pass_offset(kind)?;
        let divide_offset = pass
            .divide
            .and_then(|d| self.pass_offset(d))
            .map(|(_, o)| o);
        let motion_weight_offset = (kind == PassType::Motion)
            .then(|| self.pass_offset(PassType::MotionWeight))
            .flatten()
            .map(|(_, o)| o);
        Some(ResolvedPass {
            pass,
            offset,
            divide_offset,
            motion_weight_offset,
        })
    }

    /// Resolve an AOV by name. `None` when absent.
    pub fn get_aov(&self, name: &str) -> Option<ResolvedAov> {
        let mut offset = self.passes_size();
        for aov in &self.aovs {
            if aov.name == name {
                return Some(ResolvedAov {
                    aov: aov.clone(),
                    offset,
                });
            }
            offset += aov.kind.components() as usize;
        }
        None
    }

    /// Start of the denoising block. `None` when denoising is disabled.
    pub fn denoising_offset(&self) -> Option<usize> {
        self.denoising
            .map(|_| self.passes_size() + self.aovs_size())
    }
}

fn canonical_before(a: &Pass, b: &Pass) -> bool {
    if a.components == b.components {
        a.kind < b.kind
    } else {
        a.components > b.components
    }
}

#[cfg(test)]
#[path = "../../tests/unit/film/passes.rs"]
mod tests;
