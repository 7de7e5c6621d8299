// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Value types describing a texture: residency, flags, type and MSAA layout.

/// Which memory tier a texture's data currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum GpuResidency {
    /// Not loaded. Metadata may still be set by the application.
    OnStorage = 0,
    /// A CPU-side copy exists but nothing is on the GPU.
    OnSystemRam = 1,
    /// Uploaded to the GPU.
    Resident = 2,
}

impl GpuResidency {
    pub(crate) const fn from_u8(value: u8) -> GpuResidency {
        match value {
            0 => GpuResidency::OnStorage,
            1 => GpuResidency::OnSystemRam,
            _ => GpuResidency::Resident,
        }
    }
}

/// What happens to a texture's contents when it leaves the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GpuPageOutStrategy {
    /// Contents are dropped; the texture reloads from its source.
    #[default]
    Discard,
    /// Contents are downloaded into system RAM when paging out.
    SaveToSystemRam,
    /// A system RAM copy is kept while resident and refreshed after GPU writes.
    AlwaysKeepSystemRamCopy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TextureType {
    #[default]
    Unknown,
    Type1D,
    Type1DArray,
    Type2D,
    Type2DArray,
    TypeCube,
    TypeCubeArray,
    Type3D,
}

impl TextureType {
    /// Whether the z extent of the texture counts slices rather than depth.
    pub fn has_slices(self) -> bool {
        self != TextureType::Type3D
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            TextureType::Type1DArray | TextureType::Type2DArray | TextureType::TypeCubeArray
        )
    }

    pub fn is_cube(self) -> bool {
        matches!(self, TextureType::TypeCube | TextureType::TypeCubeArray)
    }
}

bitflags::bitflags! {
    /// Creation flags of a [`TextureGpu`](crate::textures::TextureGpu).
    ///
    /// Flags are fixed for the life of the texture, except
    /// [`TextureFlags::DISCARDABLE_CONTENT`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct TextureFlags: u32 {
        /// Never sampled; only used as a render target or UAV.
        const NOT_TEXTURE = 1 << 0;
        const RENDER_TO_TEXTURE = 1 << 1;
        /// Can be bound for unordered (read/write) access.
        const UAV = 1 << 2;
        /// Mipmaps may be generated on the GPU.
        const ALLOW_AUTOMIPMAPS = 1 << 3;
        /// Mipmaps are regenerated whenever the top level changes.
        const AUTOMIPMAPS_AUTO = 1 << 4;
        /// The application decides when a multisampled texture is resolved.
        const MSAA_EXPLICIT_RESOLVE = 1 << 5;
        /// Views with a different, bit-compatible format may be created.
        const REINTERPRETABLE = 1 << 6;
        /// Formats loaded from file are promoted to their sRGB equivalent.
        const PREFERS_LOADING_FROM_FILE_AS_SRGB = 1 << 7;
        /// Backs a window surface.
        const RENDER_WINDOW_SPECIFIC = 1 << 8;
        const REQUIRES_TEXTURE_FLIPPING = 1 << 9;
        /// Contents are produced by the application rather than loaded from a source.
        const MANUAL_TEXTURE = 1 << 10;
        /// Lives in a slice of a shared pool texture.
        const AUTOMATIC_BATCHING = 1 << 11;
        /// The shared texture backing a pool.
        const POOL_OWNER = 1 << 12;
        /// Contents need not survive between frames.
        const DISCARDABLE_CONTENT = 1 << 13;
        /// Exists only in tile memory during a render pass.
        const TILER_MEMORYLESS = 1 << 14;
        /// The depth buffer created for this render target is tile-memoryless.
        const TILER_DEPTH_MEMORYLESS = 1 << 15;
    }
}

/// Placement of MSAA sub-samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum MsaaPattern {
    #[default]
    Undefined,
    Standard,
    Center,
    CenterZero,
}

/// The multisample layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleDescription {
    colour_samples: u8,
    depth_samples: u8,
    coverage_samples: u8,
    pattern: MsaaPattern,
}

impl Default for SampleDescription {
    fn default() -> Self {
        SampleDescription::new(1, MsaaPattern::Undefined)
    }
}

impl SampleDescription {
    /// A description with the same number of colour, depth and coverage samples.
    ///
    /// Zero samples is treated as one.
    pub fn new(samples: u8, pattern: MsaaPattern) -> Self {
        let samples = samples.max(1);
        SampleDescription {
            colour_samples: samples,
            depth_samples: samples,
            coverage_samples: samples,
            pattern,
        }
    }

    /// A coverage-sampling description (CSAA/EQAA style), where coverage exceeds colour samples.
    pub fn with_coverage(colour_samples: u8, coverage_samples: u8, pattern: MsaaPattern) -> Self {
        let colour_samples = colour_samples.max(1);
        SampleDescription {
            colour_samples,
            depth_samples: colour_samples,
            coverage_samples: coverage_samples.max(colour_samples),
            pattern,
        }
    }

    pub fn colour_samples(&self) -> u8 {
        self.colour_samples
    }

    pub fn depth_samples(&self) -> u8 {
        self.depth_samples
    }

    pub fn coverage_samples(&self) -> u8 {
        self.coverage_samples
    }

    pub fn max_samples(&self) -> u8 {
        self.colour_samples
            .max(self.depth_samples)
            .max(self.coverage_samples)
    }

    pub fn pattern(&self) -> MsaaPattern {
        self.pattern
    }

    pub fn is_multisample(&self) -> bool {
        self.max_samples() > 1
    }
}
