// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Shader stage visibility and access declarations for descriptor sets.
//!
//! Every descriptor set groups its slots by the shader stage that consumes them.
//! The slots for [`ShaderType::Vertex`] come first, then [`ShaderType::Pixel`],
//! and so on in the order of [`ShaderType::ALL`]. A set records how many slots
//! each stage owns in a `[u16; NUM_SHADER_TYPES]` array.
//!
//! # Examples
//!
//! ```
//! use textures_and_passes::bindings::visible_to::{ShaderType, ResourceAccess, NUM_SHADER_TYPES};
//!
//! let mut counts = [0u16; NUM_SHADER_TYPES];
//! counts[ShaderType::Pixel.index()] = 2;
//! assert_eq!(counts.iter().sum::<u16>(), 2);
//! assert!(ResourceAccess::ReadWrite.is_write());
//! ```

/// Number of shader stages a descriptor set distinguishes.
pub const NUM_SHADER_TYPES: usize = 5;

/// A programmable pipeline stage.
///
/// The declaration order is the order in which slots are laid out inside a
/// descriptor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderType {
    /// The vertex shader.
    Vertex,
    /// The pixel (fragment) shader.
    Pixel,
    /// The geometry shader.
    Geometry,
    /// The tessellation control (hull) shader.
    Hull,
    /// The tessellation evaluation (domain) shader.
    Domain,
}

impl ShaderType {
    /// All stages in slot order.
    pub const ALL: [ShaderType; NUM_SHADER_TYPES] = [
        ShaderType::Vertex,
        ShaderType::Pixel,
        ShaderType::Geometry,
        ShaderType::Hull,
        ShaderType::Domain,
    ];

    /// Position of this stage in a per-stage count array.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// How a shader accesses an unordered-access slot.
///
/// [`ResourceAccess::Undefined`] exists so a slot can be built before its
/// access is known; descriptor sets reject it during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ResourceAccess {
    #[default]
    Undefined,
    Read,
    Write,
    ReadWrite,
}

impl ResourceAccess {
    pub fn is_read(self) -> bool {
        matches!(self, ResourceAccess::Read | ResourceAccess::ReadWrite)
    }

    pub fn is_write(self) -> bool {
        matches!(self, ResourceAccess::Write | ResourceAccess::ReadWrite)
    }
}

/// Sums per-stage counts the way every descriptor set validates them.
pub(crate) fn total_count(counts: &[u16; NUM_SHADER_TYPES]) -> usize {
    counts.iter().map(|&c| c as usize).sum()
}

/// Index range of the slots owned by `stage`.
pub(crate) fn stage_range(counts: &[u16; NUM_SHADER_TYPES], stage: ShaderType) -> std::ops::Range<usize> {
    let start = total_count_before(counts, stage);
    start..start + counts[stage.index()] as usize
}

fn total_count_before(counts: &[u16; NUM_SHADER_TYPES], stage: ShaderType) -> usize {
    counts[..stage.index()].iter().map(|&c| c as usize).sum()
}
