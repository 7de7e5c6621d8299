// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::sync::Arc;

use crate::error::Error;
use crate::textures::TextureGpu;

/// Maximum number of simultaneous colour targets.
pub const MAX_MULTIPLE_RENDER_TARGETS: usize = 8;

/// What happens to an attachment's contents when a pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadAction {
    /// Contents are undefined.
    DontCare,
    /// Contents are cleared to the target's clear value.
    #[default]
    Clear,
    /// Clear on tile-based GPUs, load everywhere else.
    ClearOnTilers,
    /// Previous contents are kept.
    Load,
}

impl LoadAction {
    /// The action a GPU actually performs.
    pub fn effective(self, is_tiler: bool) -> LoadAction {
        match self {
            LoadAction::ClearOnTilers if is_tiler => LoadAction::Clear,
            LoadAction::ClearOnTilers => LoadAction::Load,
            other => other,
        }
    }
}

/// What happens to an attachment's contents when a pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreAction {
    /// Contents may be discarded.
    DontCare,
    /// Contents are written back.
    Store,
    /// The multisampled contents are resolved into the resolve texture and
    /// then discarded.
    MultisampleResolve,
    /// The multisampled contents are resolved and also kept.
    StoreAndMultisampleResolve,
    /// Becomes [`StoreAction::MultisampleResolve`] for multisampled targets with
    /// somewhere to resolve to, [`StoreAction::Store`] otherwise.
    #[default]
    StoreOrResolve,
}

impl StoreAction {
    pub fn resolves(self) -> bool {
        matches!(self, StoreAction::MultisampleResolve | StoreAction::StoreAndMultisampleResolve)
    }
}

bitflags::bitflags! {
    /// Which attachments of a [`RenderPassDescriptor`] were modified.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryTypes: u16 {
        const COLOUR0 = 1 << 0;
        const COLOUR1 = 1 << 1;
        const COLOUR2 = 1 << 2;
        const COLOUR3 = 1 << 3;
        const COLOUR4 = 1 << 4;
        const COLOUR5 = 1 << 5;
        const COLOUR6 = 1 << 6;
        const COLOUR7 = 1 << 7;
        const DEPTH = 1 << 8;
        const STENCIL = 1 << 9;
        const COLOUR = 0xff;
        const ALL = 0x3ff;
    }
}

impl EntryTypes {
    /// The flag of colour target `index`.
    pub fn colour(index: usize) -> EntryTypes {
        assert!(index < MAX_MULTIPLE_RENDER_TARGETS, "colour index {index} out of range");
        EntryTypes::from_bits_truncate(1 << index)
    }
}

/// The part of an attachment shared by colour, depth and stencil targets.
#[derive(Debug, Clone, Default)]
pub struct RenderPassTarget {
    pub texture: Option<Arc<TextureGpu>>,
    /// Where multisampled contents are resolved to. May be `texture` itself
    /// for implicit resolves.
    pub resolve_texture: Option<Arc<TextureGpu>>,
    pub mip_level: u8,
    pub resolve_mip_level: u8,
    pub slice: u16,
    pub resolve_slice: u16,
    /// Render to every slice at once (layered rendering).
    pub all_layers: bool,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
}

impl RenderPassTarget {
    pub fn new(texture: Arc<TextureGpu>) -> Self {
        RenderPassTarget {
            texture: Some(texture),
            ..Self::default()
        }
    }

    pub fn with_resolve_texture(mut self, resolve_texture: Arc<TextureGpu>) -> Self {
        self.resolve_texture = Some(resolve_texture);
        self
    }

    pub fn with_actions(mut self, load_action: LoadAction, store_action: StoreAction) -> Self {
        self.load_action = load_action;
        self.store_action = store_action;
        self
    }

    pub fn with_slice(mut self, mip_level: u8, slice: u16) -> Self {
        self.mip_level = mip_level;
        self.slice = slice;
        self
    }

    fn uses(&self, texture: &TextureGpu) -> bool {
        [&self.texture, &self.resolve_texture]
            .into_iter()
            .flatten()
            .any(|t| t.id() == texture.id())
    }

    fn requires_texture_flipping(&self) -> bool {
        match (&self.resolve_texture, &self.texture) {
            (Some(resolve), _) => resolve.requires_texture_flipping(),
            (None, Some(texture)) => texture.requires_texture_flipping(),
            (None, None) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderPassColourTarget {
    pub target: RenderPassTarget,
    pub clear_colour: [f32; 4],
}

impl Default for RenderPassColourTarget {
    fn default() -> Self {
        RenderPassColourTarget {
            target: RenderPassTarget::default(),
            clear_colour: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderPassDepthTarget {
    pub target: RenderPassTarget,
    pub clear_depth: f32,
    pub read_only: bool,
}

impl Default for RenderPassDepthTarget {
    fn default() -> Self {
        RenderPassDepthTarget {
            target: RenderPassTarget::default(),
            clear_depth: 1.0,
            read_only: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderPassStencilTarget {
    pub target: RenderPassTarget,
    pub clear_stencil: u32,
    pub read_only: bool,
}

/**
The attachments of a render pass.

Attachments are public fields. After changing any of them, call
[`entries_modified`](Self::entries_modified) with the entries that changed; it
validates the attachments and recomputes the derived state. A failed call
leaves the descriptor exactly as it was before the call.

```
use textures_and_passes::error::ErrorKind;
use textures_and_passes::passes::{EntryTypes, RenderPassDescriptor};

let mut empty = RenderPassDescriptor::new();
let err = empty.entries_modified(EntryTypes::ALL).unwrap_err();
assert_eq!(err.kind(), ErrorKind::InvalidParameters);
```
*/
#[derive(Debug, Clone, Default)]
pub struct RenderPassDescriptor {
    pub colour: [RenderPassColourTarget; MAX_MULTIPLE_RENDER_TARGETS],
    pub depth: RenderPassDepthTarget,
    pub stencil: RenderPassStencilTarget,
    num_colour_entries: u8,
    requires_texture_flipping: bool,
}

fn is_colour_memoryless(texture: &TextureGpu) -> bool {
    texture.is_tiler_memoryless()
}

fn is_depth_memoryless(texture: &TextureGpu) -> bool {
    texture.is_tiler_memoryless() || texture.is_tiler_depth_memoryless()
}

impl RenderPassDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leading populated colour targets.
    pub fn num_colour_entries(&self) -> u8 {
        self.num_colour_entries
    }

    /// The colour targets that take part in the pass.
    pub fn colour_targets(&self) -> &[RenderPassColourTarget] {
        &self.colour[..self.num_colour_entries as usize]
    }

    pub fn requires_texture_flipping(&self) -> bool {
        self.requires_texture_flipping
    }

    /// Whether `texture` is rendered to or resolved into by this pass.
    pub fn has_attachment(&self, texture: &TextureGpu) -> bool {
        self.colour_targets().iter().any(|c| c.target.uses(texture))
            || self.depth.target.uses(texture)
            || self.stencil.target.uses(texture)
    }

    /// Whether both descriptors render into the same attachments, ignoring
    /// load and store actions and clear values.
    pub fn has_same_attachments(&self, other: &RenderPassDescriptor) -> bool {
        super::FrameBufferDescKey::from(self) == super::FrameBufferDescKey::from(other)
    }

    /// Validates the attachments named by `entry_types` and recomputes the
    /// number of colour entries and whether texture flipping is required.
    ///
    /// Fails with [`Error::InvalidParameters`] when:
    /// - no attachment is present;
    /// - a resolving store action has no resolve texture;
    /// - a resolve texture is set on a target that is not multisampled, is
    ///   tile-memoryless, or resolves a texture into itself from a mip or
    ///   slice other than 0;
    /// - layered rendering starts at a slice other than 0;
    /// - a tile-memoryless target loads or stores its contents;
    /// - the depth or stencil texture has no depth or stencil format;
    /// - the depth or stencil texture cannot serve a colour target;
    /// - a colour target is not a render target, or a render window is
    ///   combined with other colour targets.
    ///
    /// A non-multisampled render window with a resolve texture is corrected
    /// instead: the resolve texture is dropped and the store action becomes
    /// [`StoreAction::Store`].
    pub fn entries_modified(&mut self, entry_types: EntryTypes) -> Result<(), Error> {
        let mut next = self.clone();
        next.apply_entries_modified(entry_types)?;
        *self = next;
        Ok(())
    }

    fn apply_entries_modified(&mut self, entry_types: EntryTypes) -> Result<(), Error> {
        if entry_types.intersects(EntryTypes::COLOUR) {
            self.colour_entries_modified()?;
        }
        if entry_types.contains(EntryTypes::DEPTH) {
            check_depth_stencil(&mut self.depth.target, "depth", PixelFormatCheck::Depth)?;
        }
        if entry_types.contains(EntryTypes::STENCIL) {
            check_depth_stencil(&mut self.stencil.target, "stencil", PixelFormatCheck::Stencil)?;
        }
        if self.num_colour_entries == 0 && self.depth.target.texture.is_none() && self.stencil.target.texture.is_none()
        {
            return Err(Error::invalid_parameters(
                "a render pass needs at least one colour, depth or stencil attachment",
            ));
        }
        self.check_depth_compatibility()?;
        let flipping = self
            .colour_targets()
            .iter()
            .map(|c| &c.target)
            .chain([&self.depth.target, &self.stencil.target])
            .any(RenderPassTarget::requires_texture_flipping);
        self.requires_texture_flipping = flipping;
        Ok(())
    }

    fn colour_entries_modified(&mut self) -> Result<(), Error> {
        let num = self.colour.iter().take_while(|c| c.target.texture.is_some()).count();
        if self.colour[num..].iter().any(|c| c.target.texture.is_some()) {
            logwise::warn_sync!(
                "Colour targets after the first empty slot {slot} are ignored",
                slot = num
            );
        }
        self.num_colour_entries = num as u8;

        let windows = self.colour[..num]
            .iter()
            .filter(|c| c.target.texture.as_ref().is_some_and(|t| t.is_render_window_specific()))
            .count();
        if windows > 0 && num > 1 {
            return Err(Error::invalid_parameters(
                "a render window cannot be used as MRT with other colour textures",
            ));
        }

        for (index, colour) in self.colour[..num].iter_mut().enumerate() {
            let target = &mut colour.target;
            let Some(texture) = target.texture.clone() else {
                continue;
            };
            if !texture.is_render_to_texture() && !texture.is_render_window_specific() {
                return Err(Error::invalid_parameters(format!(
                    "colour target {index} ({}) was not created as a render target",
                    texture.name()
                )));
            }
            if texture.is_render_window_specific() && !texture.is_multisample() && target.resolve_texture.is_some() {
                // The window is not multisampled, so there is nothing to resolve.
                logwise::warn_sync!(
                    "Dropping resolve texture of render window {name}",
                    name = logwise::privacy::LogIt(texture.name())
                );
                target.resolve_texture = None;
                target.store_action = StoreAction::Store;
            }
            check_target(target, &format!("colour target {index}"), is_colour_memoryless)?;
        }
        Ok(())
    }

    fn check_depth_compatibility(&self) -> Result<(), Error> {
        let depth_stencil = [&self.depth.target.texture, &self.stencil.target.texture];
        for colour in self.colour_targets() {
            let Some(colour) = &colour.target.texture else {
                continue;
            };
            for attachment in depth_stencil.into_iter().flatten() {
                if !attachment.supports_as_depth_buffer_for(colour) {
                    return Err(Error::invalid_parameters(format!(
                        "{} cannot be the depth buffer of colour target {}",
                        attachment.name(),
                        colour.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum PixelFormatCheck {
    Depth,
    Stencil,
}

fn check_depth_stencil(target: &mut RenderPassTarget, what: &str, format: PixelFormatCheck) -> Result<(), Error> {
    let Some(texture) = target.texture.clone() else {
        return Ok(());
    };
    let pixel_format = texture.pixel_format();
    let matches = match format {
        PixelFormatCheck::Depth => pixel_format.is_depth(),
        PixelFormatCheck::Stencil => pixel_format.is_stencil(),
    };
    if !matches {
        return Err(Error::invalid_parameters(format!(
            "{what} attachment {} has format {}, which has no {what}",
            texture.name(),
            pixel_format.name()
        )));
    }
    check_target(target, &format!("{what} attachment"), is_depth_memoryless)
}

/// Checks the rules shared by every attachment kind, normalising
/// [`StoreAction::StoreOrResolve`] first.
fn check_target(target: &mut RenderPassTarget, what: &str, memoryless: fn(&TextureGpu) -> bool) -> Result<(), Error> {
    let Some(texture) = target.texture.clone() else {
        return Ok(());
    };

    if target.store_action == StoreAction::StoreOrResolve {
        if texture.is_multisample() && target.resolve_texture.is_none() && !texture.has_msaa_explicit_resolves() {
            target.resolve_texture = Some(texture.clone());
        }
        target.store_action = if texture.is_multisample() && target.resolve_texture.is_some() {
            StoreAction::MultisampleResolve
        } else {
            StoreAction::Store
        };
    }

    if target.store_action.resolves() && target.resolve_texture.is_none() {
        return Err(Error::invalid_parameters(format!(
            "{what} ({}) resolves but has no resolve texture",
            texture.name()
        )));
    }
    if target.all_layers && target.slice != 0 {
        return Err(Error::invalid_parameters(format!(
            "{what} ({}) renders to all layers and must start at slice 0, not {}",
            texture.name(),
            target.slice
        )));
    }
    if let Some(resolve) = &target.resolve_texture {
        if !texture.is_multisample() {
            return Err(Error::invalid_parameters(format!(
                "{what} has resolve texture {} but {} is not multisampled",
                resolve.name(),
                texture.name()
            )));
        }
        if memoryless(resolve) {
            return Err(Error::invalid_parameters(format!(
                "resolve texture {} of {what} is tile-memoryless",
                resolve.name()
            )));
        }
        if Arc::ptr_eq(resolve, &texture) {
            if target.mip_level != 0 || target.slice != 0 {
                return Err(Error::invalid_parameters(format!(
                    "{what} ({}) resolves into itself and must use mip 0 and slice 0 without explicit resolves",
                    texture.name()
                )));
            }
        } else if resolve.is_multisample() {
            return Err(Error::invalid_parameters(format!(
                "resolve texture {} of {what} is multisampled",
                resolve.name()
            )));
        }
    }
    if memoryless(&texture) {
        if target.load_action == LoadAction::Load {
            return Err(Error::invalid_parameters(format!(
                "{what} ({}) is tile-memoryless and cannot load its contents",
                texture.name()
            )));
        }
        let store_allowed = match target.store_action {
            StoreAction::DontCare => true,
            StoreAction::MultisampleResolve => texture.is_multisample(),
            _ => false,
        };
        if !store_allowed {
            return Err(Error::invalid_parameters(format!(
                "{what} ({}) is tile-memoryless and cannot use {:?}",
                texture.name(),
                target.store_action
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResidencyConfig;
    use crate::error::ErrorKind;
    use crate::imp::nop::NopBackend;
    use crate::pixel_formats::PixelFormatGpu;
    use crate::textures::{MsaaPattern, SampleDescription, TextureFlags, TextureGpuManager, TextureType};

    fn target(
        manager: &TextureGpuManager,
        name: &str,
        flags: TextureFlags,
        format: PixelFormatGpu,
        samples: u8,
    ) -> Arc<TextureGpu> {
        manager
            .texture(name, TextureType::Type2D)
            .with_flags(flags)
            .with_resolution(128, 128, 1)
            .with_pixel_format(format)
            .with_sample_description(SampleDescription::new(samples, MsaaPattern::Standard))
            .build()
            .unwrap()
    }

    fn manager() -> TextureGpuManager {
        TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn clear_on_tilers_depends_on_the_gpu() {
        assert_eq!(LoadAction::ClearOnTilers.effective(true), LoadAction::Clear);
        assert_eq!(LoadAction::ClearOnTilers.effective(false), LoadAction::Load);
        assert_eq!(LoadAction::DontCare.effective(true), LoadAction::DontCare);
        assert_eq!(EntryTypes::colour(3), EntryTypes::COLOUR3);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn colour_entries_stop_at_the_first_gap() {
        let manager = manager();
        let a = target(&manager, "a", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);
        let b = target(&manager, "b", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);
        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target = RenderPassTarget::new(a.clone());
        desc.colour[2].target = RenderPassTarget::new(b.clone());
        desc.entries_modified(EntryTypes::ALL).unwrap();
        assert_eq!(desc.num_colour_entries(), 1);
        assert!(desc.has_attachment(&a));
        assert!(!desc.has_attachment(&b));
        assert_eq!(desc.colour[0].target.store_action, StoreAction::Store);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn store_or_resolve_resolves_msaa_into_itself() {
        let manager = manager();
        let msaa = target(&manager, "msaa", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 4);
        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target = RenderPassTarget::new(msaa.clone());
        desc.entries_modified(EntryTypes::COLOUR0).unwrap();
        assert_eq!(desc.colour[0].target.store_action, StoreAction::MultisampleResolve);
        assert!(Arc::ptr_eq(desc.colour[0].target.resolve_texture.as_ref().unwrap(), &msaa));

        let explicit = target(
            &manager,
            "explicit",
            TextureFlags::RENDER_TO_TEXTURE | TextureFlags::MSAA_EXPLICIT_RESOLVE,
            PixelFormatGpu::Rgba8Unorm,
            4,
        );
        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target = RenderPassTarget::new(explicit);
        desc.entries_modified(EntryTypes::COLOUR0).unwrap();
        assert_eq!(desc.colour[0].target.store_action, StoreAction::Store);
        assert!(desc.colour[0].target.resolve_texture.is_none());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn self_resolve_needs_mip_and_slice_zero() {
        let manager = manager();
        let msaa = target(&manager, "msaa", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 4);
        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target = RenderPassTarget::new(msaa.clone())
            .with_resolve_texture(msaa)
            .with_actions(LoadAction::Clear, StoreAction::MultisampleResolve)
            .with_slice(1, 0);
        let err = desc.entries_modified(EntryTypes::COLOUR0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameters);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn resolve_requires_an_msaa_source() {
        let manager = manager();
        let single = target(&manager, "single", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);
        let resolve = target(&manager, "resolve", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);
        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target = RenderPassTarget::new(single)
            .with_resolve_texture(resolve)
            .with_actions(LoadAction::Clear, StoreAction::MultisampleResolve);
        assert!(desc.entries_modified(EntryTypes::COLOUR0).is_err());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn layered_rendering_starts_at_slice_zero() {
        let manager = manager();
        let array = manager
            .texture("array", TextureType::Type2DArray)
            .with_flags(TextureFlags::RENDER_TO_TEXTURE)
            .with_resolution(64, 64, 4)
            .with_pixel_format(PixelFormatGpu::Rgba8Unorm)
            .build()
            .unwrap();
        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target = RenderPassTarget::new(array).with_slice(0, 2);
        desc.colour[0].target.all_layers = true;
        assert!(desc.entries_modified(EntryTypes::COLOUR0).is_err());
        desc.colour[0].target.slice = 0;
        desc.entries_modified(EntryTypes::COLOUR0).unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn depth_needs_a_depth_format_and_matching_geometry() {
        let manager = manager();
        let colour = target(&manager, "colour", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);
        let not_depth = target(&manager, "not depth", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::R32Float, 1);
        let depth_msaa = target(&manager, "depth msaa", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::D32Float, 4);
        let depth = target(&manager, "depth", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::D32Float, 1);

        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target = RenderPassTarget::new(colour);
        desc.depth.target = RenderPassTarget::new(not_depth);
        assert!(desc.entries_modified(EntryTypes::ALL).is_err());
        desc.depth.target = RenderPassTarget::new(depth_msaa);
        assert!(desc.entries_modified(EntryTypes::ALL).is_err());
        desc.depth.target = RenderPassTarget::new(depth);
        desc.entries_modified(EntryTypes::ALL).unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn stencil_needs_a_stencil_format() {
        let manager = manager();
        let depth_only = target(&manager, "d32", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::D32Float, 1);
        let packed = target(&manager, "d24s8", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::D24UnormS8Uint, 1);
        let mut desc = RenderPassDescriptor::new();
        desc.stencil.target = RenderPassTarget::new(depth_only);
        assert!(desc.entries_modified(EntryTypes::STENCIL).is_err());
        desc.depth.target = RenderPassTarget::new(packed.clone());
        desc.stencil.target = RenderPassTarget::new(packed);
        desc.entries_modified(EntryTypes::DEPTH | EntryTypes::STENCIL).unwrap();
        assert_eq!(desc.num_colour_entries(), 0);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn memoryless_targets_cannot_load() {
        let manager = manager();
        let memoryless = target(
            &manager,
            "memoryless",
            TextureFlags::RENDER_TO_TEXTURE | TextureFlags::TILER_MEMORYLESS,
            PixelFormatGpu::Rgba8Unorm,
            1,
        );
        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target =
            RenderPassTarget::new(memoryless).with_actions(LoadAction::Load, StoreAction::DontCare);
        assert!(desc.entries_modified(EntryTypes::COLOUR0).is_err());
        desc.colour[0].target.load_action = LoadAction::ClearOnTilers;
        desc.entries_modified(EntryTypes::COLOUR0).unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn failed_validation_leaves_the_descriptor_untouched() {
        let manager = manager();
        let plain = target(&manager, "plain", TextureFlags::empty(), PixelFormatGpu::Rgba8Unorm, 1);
        let rt = target(&manager, "rt", TextureFlags::RENDER_TO_TEXTURE, PixelFormatGpu::Rgba8Unorm, 1);
        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target = RenderPassTarget::new(rt);
        desc.entries_modified(EntryTypes::COLOUR0).unwrap();
        assert_eq!(desc.num_colour_entries(), 1);

        desc.colour[1].target = RenderPassTarget::new(plain);
        assert!(desc.entries_modified(EntryTypes::COLOUR1).is_err());
        assert_eq!(desc.num_colour_entries(), 1);
        assert_eq!(desc.colour[1].target.store_action, StoreAction::StoreOrResolve);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn flipping_follows_the_resolve_destination() {
        let manager = manager();
        let msaa = target(
            &manager,
            "msaa",
            TextureFlags::RENDER_TO_TEXTURE | TextureFlags::MSAA_EXPLICIT_RESOLVE,
            PixelFormatGpu::Rgba8Unorm,
            4,
        );
        let flipped = target(
            &manager,
            "flipped",
            TextureFlags::RENDER_TO_TEXTURE | TextureFlags::REQUIRES_TEXTURE_FLIPPING,
            PixelFormatGpu::Rgba8Unorm,
            1,
        );
        let mut desc = RenderPassDescriptor::new();
        desc.colour[0].target = RenderPassTarget::new(msaa.clone());
        desc.entries_modified(EntryTypes::COLOUR0).unwrap();
        assert!(!desc.requires_texture_flipping());

        desc.colour[0].target = RenderPassTarget::new(msaa)
            .with_resolve_texture(flipped)
            .with_actions(LoadAction::Clear, StoreAction::MultisampleResolve);
        desc.entries_modified(EntryTypes::COLOUR0).unwrap();
        assert!(desc.requires_texture_flipping());
    }
}
