// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Render pass attachments.

A [`RenderPassDescriptor`] names the colour, depth and stencil textures a pass
renders into and what happens to their contents at the start and end of the
pass. [`RenderPassDescriptor::entries_modified`] validates the combination.
[`FrameBufferDescKey`] identifies the framebuffer a descriptor needs so
backends can share framebuffer objects between passes.
*/

mod frame_buffer_key;
mod render_pass_descriptor;

pub use frame_buffer_key::{AttachmentKey, FrameBufferDescKey};
pub use render_pass_descriptor::{
    EntryTypes, LoadAction, MAX_MULTIPLE_RENDER_TARGETS, RenderPassColourTarget, RenderPassDepthTarget,
    RenderPassDescriptor, RenderPassStencilTarget, RenderPassTarget, StoreAction,
};
