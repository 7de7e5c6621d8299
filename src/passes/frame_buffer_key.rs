// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use super::render_pass_descriptor::{RenderPassDescriptor, RenderPassTarget};
use crate::textures::TextureId;

/// The attachment part of a render pass target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentKey {
    pub texture: TextureId,
    pub resolve_texture: Option<TextureId>,
    pub mip_level: u8,
    pub resolve_mip_level: u8,
    pub slice: u16,
    pub resolve_slice: u16,
    pub all_layers: bool,
}

impl AttachmentKey {
    fn new(target: &RenderPassTarget) -> Option<Self> {
        let texture = target.texture.as_ref()?;
        Some(AttachmentKey {
            texture: texture.id(),
            resolve_texture: target.resolve_texture.as_ref().map(|t| t.id()),
            mip_level: target.mip_level,
            resolve_mip_level: target.resolve_mip_level,
            slice: target.slice,
            resolve_slice: target.resolve_slice,
            all_layers: target.all_layers,
        })
    }
}

/// Identity of the framebuffer a [`RenderPassDescriptor`] renders into.
///
/// Load and store actions and clear values do not change which framebuffer
/// object a backend needs, so descriptors that differ only in those share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameBufferDescKey {
    colour: Vec<AttachmentKey>,
    depth: Option<AttachmentKey>,
    stencil: Option<AttachmentKey>,
    read_only_depth: bool,
    read_only_stencil: bool,
}

impl FrameBufferDescKey {
    pub fn colour(&self) -> &[AttachmentKey] {
        &self.colour
    }

    pub fn depth(&self) -> Option<&AttachmentKey> {
        self.depth.as_ref()
    }

    pub fn stencil(&self) -> Option<&AttachmentKey> {
        self.stencil.as_ref()
    }
}

impl From<&RenderPassDescriptor> for FrameBufferDescKey {
    fn from(desc: &RenderPassDescriptor) -> Self {
        FrameBufferDescKey {
            colour: desc
                .colour_targets()
                .iter()
                .filter_map(|c| AttachmentKey::new(&c.target))
                .collect(),
            depth: AttachmentKey::new(&desc.depth.target),
            stencil: AttachmentKey::new(&desc.stencil.target),
            read_only_depth: desc.depth.read_only,
            read_only_stencil: desc.stencil.read_only,
        }
    }
}
