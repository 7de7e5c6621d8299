// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Parameters of a texture-to-texture copy.

use super::TexelBox;

/// Who manages the resource layout (barrier state) of a texture around a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceTransitionMode {
    /// The copy transitions the texture into the copy layout and back.
    #[default]
    Auto,
    /// The texture is already in the copy layout; the copy transitions it back afterwards.
    AlreadyInLayoutThenAuto,
    /// The texture is already in the copy layout and the caller transitions it back.
    ///
    /// Two copies that touch overlapping regions of the same texture race when
    /// the caller issues the transition between them in the wrong order. Nothing
    /// detects this; callers that choose manual transitions must order them.
    AlreadyInLayoutThenManual,
}

/// A copy from one texture region to another, built fluently.
///
/// # Examples
///
/// ```
/// use textures_and_passes::textures::{ResourceTransitionMode, TexelBox, TextureCopy};
///
/// let region = TexelBox::full(64, 64, 1);
/// let copy = TextureCopy::new(region, 0, region, 0)
///     .with_keep_resolved_tex_synced(false)
///     .with_transition_modes(ResourceTransitionMode::Auto, ResourceTransitionMode::AlreadyInLayoutThenAuto);
/// assert!(!copy.keep_resolved_tex_synced());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCopy {
    src_box: TexelBox,
    src_mip: u8,
    dst_box: TexelBox,
    dst_mip: u8,
    keep_resolved_tex_synced: bool,
    src_transition_mode: ResourceTransitionMode,
    dst_transition_mode: ResourceTransitionMode,
}

impl TextureCopy {
    pub fn new(src_box: TexelBox, src_mip: u8, dst_box: TexelBox, dst_mip: u8) -> Self {
        TextureCopy {
            src_box,
            src_mip,
            dst_box,
            dst_mip,
            keep_resolved_tex_synced: true,
            src_transition_mode: ResourceTransitionMode::Auto,
            dst_transition_mode: ResourceTransitionMode::Auto,
        }
    }

    /// When the destination is multisampled with an implicit resolve, also refresh
    /// the resolved contents. Defaults to true.
    pub fn with_keep_resolved_tex_synced(mut self, keep: bool) -> Self {
        self.keep_resolved_tex_synced = keep;
        self
    }

    pub fn with_transition_modes(mut self, src: ResourceTransitionMode, dst: ResourceTransitionMode) -> Self {
        self.src_transition_mode = src;
        self.dst_transition_mode = dst;
        self
    }

    pub fn src_box(&self) -> TexelBox {
        self.src_box
    }

    pub fn src_mip(&self) -> u8 {
        self.src_mip
    }

    pub fn dst_box(&self) -> TexelBox {
        self.dst_box
    }

    pub fn dst_mip(&self) -> u8 {
        self.dst_mip
    }

    pub fn keep_resolved_tex_synced(&self) -> bool {
        self.keep_resolved_tex_synced
    }

    pub fn src_transition_mode(&self) -> ResourceTransitionMode {
        self.src_transition_mode
    }

    pub fn dst_transition_mode(&self) -> ResourceTransitionMode {
        self.dst_transition_mode
    }

    /// The same copy with each box moved along z by the given slice offsets.
    pub(crate) fn offset_slices(&self, src_offset: u32, dst_offset: u32) -> TextureCopy {
        let mut copy = *self;
        copy.src_box.front += src_offset;
        copy.src_box.back += src_offset;
        copy.dst_box.front += dst_offset;
        copy.dst_box.back += dst_offset;
        copy
    }
}
