// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The GPU texture resource and its residency state machine.

A [`TextureGpu`] starts [`GpuResidency::OnStorage`]. Scheduling a transition
queues work with the owning [`TextureGpuManager`](super::TextureGpuManager);
the manager's worker loads the image and drives the texture through
`OnStorage → (OnSystemRam →) Resident`, then reports completion with
[`TextureGpu::notify_data_is_ready`]. The reverse path pages contents out.

# Threading

Residency, the scheduled residency and the count of pending preparations are
atomics and may be queried from any thread. Geometry and format live behind a
mutex; setters succeed only while the texture is `OnStorage` with its metadata
ready, so they never race the worker. Getters called while
[`TextureGpu::is_metadata_ready`] is false may observe values the worker is
about to replace. Use [`TextureGpu::wait_for_metadata`] to synchronize.

[`TextureGpu::transition_to`] is the low-level mutator the worker uses. Calling it
directly is fine for textures that are never scheduled (typically manual
render targets). Mixing it with scheduling on the same texture is not.
*/

use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::error::Error;
use crate::imp::{BackendTexture, BackendTextureDesc};
use crate::pixel_formats::{PixelFormatGpu, SYS_RAM_ROW_ALIGNMENT, max_mipmaps, mip_extent};

use super::manager::{CachedMetadata, ManagerShared, ScheduledTransition, TransitionKind};
use super::residency_tracking::ResidencyTracker;
use super::{
    GpuPageOutStrategy, GpuResidency, Image2, PoolId, SampleDescription, TexelBox,
    TextureChangeReason, TextureCopy, TextureFlags, TextureGpuListener, TextureType,
};

static NEXT_TEXTURE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u32);

impl TextureId {
    fn next() -> Self {
        TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Geometry and format of a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureMetadata {
    pub width: u32,
    pub height: u32,
    pub depth_or_slices: u32,
    pub num_mipmaps: u8,
    pub texture_type: TextureType,
    pub pixel_format: PixelFormatGpu,
    /// What the backend is using. Equal to the requested description until the
    /// texture first becomes resident.
    pub sample_description: SampleDescription,
    pub requested_sample_description: SampleDescription,
}

impl TextureMetadata {
    fn new(texture_type: TextureType) -> Self {
        TextureMetadata {
            width: 0,
            height: 0,
            depth_or_slices: if texture_type.is_cube() { 6 } else { 1 },
            num_mipmaps: 1,
            texture_type,
            pixel_format: PixelFormatGpu::Unknown,
            sample_description: SampleDescription::default(),
            requested_sample_description: SampleDescription::default(),
        }
    }

    fn depth_at(&self, mip: u8) -> u32 {
        if self.texture_type.has_slices() {
            self.depth_or_slices
        } else {
            mip_extent(self.depth_or_slices, mip)
        }
    }

    /// Extent of `mip` as a box, z covering every slice (or depth layer).
    pub fn mip_box(&self, mip: u8) -> TexelBox {
        TexelBox::full(
            mip_extent(self.width, mip),
            mip_extent(self.height, mip),
            self.depth_at(mip),
        )
    }

    fn mip_size_bytes(&self, mip: u8) -> usize {
        self.pixel_format.size_bytes(
            mip_extent(self.width, mip),
            mip_extent(self.height, mip),
            self.depth_at(mip),
            1,
            SYS_RAM_ROW_ALIGNMENT,
        )
    }

    /// Bytes of a system RAM copy holding the whole mip chain.
    pub fn sys_ram_size_bytes(&self) -> usize {
        (0..self.num_mipmaps).map(|mip| self.mip_size_bytes(mip)).sum()
    }
}

/// Parameters of a scheduled residency change.
///
/// Converts from a bare [`GpuResidency`] for the common case.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    residency: GpuResidency,
    image: Option<Arc<Image2>>,
    auto_delete_image: bool,
    skip_multiload: bool,
}

impl TransitionRequest {
    pub fn new(residency: GpuResidency) -> Self {
        TransitionRequest {
            residency,
            image: None,
            auto_delete_image: true,
            skip_multiload: false,
        }
    }

    /// Load from an already decoded image instead of the texture's source.
    pub fn with_image(mut self, image: Arc<Image2>) -> Self {
        self.image = Some(image);
        self
    }

    /// With `true` (the default) the worker may take over the image's buffer when
    /// it holds the last reference. With `false` it always copies.
    pub fn with_auto_delete_image(mut self, auto_delete: bool) -> Self {
        self.auto_delete_image = auto_delete;
        self
    }

    /// Decode this texture on the worker itself, outside any parallel batch.
    pub fn with_skip_multiload(mut self, skip: bool) -> Self {
        self.skip_multiload = skip;
        self
    }

    pub fn residency(&self) -> GpuResidency {
        self.residency
    }
}

impl From<GpuResidency> for TransitionRequest {
    fn from(residency: GpuResidency) -> Self {
        TransitionRequest::new(residency)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PoolSlot {
    pool: PoolId,
    slice: u16,
}

/// A GPU texture.
pub struct TextureGpu {
    id: TextureId,
    name: String,
    flags: AtomicU32,
    page_out_strategy: GpuPageOutStrategy,
    tracker: ResidencyTracker,
    metadata: Mutex<TextureMetadata>,
    pool_slot: Mutex<Option<PoolSlot>>,
    displaying_dummy: AtomicBool,
    sys_ram_copy: Mutex<Option<Box<[u8]>>>,
    backend_texture: Mutex<Option<Box<dyn BackendTexture>>>,
    listeners: Mutex<Vec<Arc<dyn TextureGpuListener>>>,
    manager: Weak<ManagerShared>,
}

impl Debug for TextureGpu {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureGpu")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("flags", &self.flags())
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl TextureGpu {
    pub(crate) fn new(
        name: String,
        mut flags: TextureFlags,
        texture_type: TextureType,
        page_out_strategy: GpuPageOutStrategy,
        manager: Weak<ManagerShared>,
    ) -> Self {
        if flags.intersects(TextureFlags::NOT_TEXTURE | TextureFlags::RENDER_TO_TEXTURE | TextureFlags::UAV) {
            flags |= TextureFlags::MANUAL_TEXTURE;
        }
        TextureGpu {
            id: TextureId::next(),
            name,
            flags: AtomicU32::new(flags.bits()),
            page_out_strategy,
            tracker: ResidencyTracker::new(GpuResidency::OnStorage),
            metadata: Mutex::new(TextureMetadata::new(texture_type)),
            pool_slot: Mutex::new(None),
            displaying_dummy: AtomicBool::new(false),
            sys_ram_copy: Mutex::new(None),
            backend_texture: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            manager,
        }
    }

    fn manager(&self) -> Result<Arc<ManagerShared>, Error> {
        self.manager
            .upgrade()
            .ok_or_else(|| Error::invalid_state(format!("the manager of {} was dropped", self.name)))
    }

    fn lock_metadata(&self) -> std::sync::MutexGuard<'_, TextureMetadata> {
        self.metadata.lock().expect("Failed to lock texture metadata")
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> TextureFlags {
        TextureFlags::from_bits_truncate(self.flags.load(Ordering::Relaxed))
    }

    /// Toggles [`TextureFlags::DISCARDABLE_CONTENT`], the one mutable flag.
    pub fn set_discardable_content(&self, discardable: bool) {
        let bit = TextureFlags::DISCARDABLE_CONTENT.bits();
        if discardable {
            self.flags.fetch_or(bit, Ordering::Relaxed);
        } else {
            self.flags.fetch_and(!bit, Ordering::Relaxed);
        }
    }

    pub fn page_out_strategy(&self) -> GpuPageOutStrategy {
        self.page_out_strategy
    }

    pub fn residency(&self) -> GpuResidency {
        self.tracker.residency()
    }

    /// The residency the texture will have once every scheduled transition completes.
    pub fn next_residency(&self) -> GpuResidency {
        self.tracker.next_residency()
    }

    /// Scheduled transitions that have not completed yet.
    pub fn pending_transitions(&self) -> u32 {
        self.tracker.pending()
    }

    pub fn has_load_failed(&self) -> bool {
        self.tracker.load_failed()
    }

    /// Whether rendering currently samples the placeholder instead of real data.
    ///
    /// A texture whose load failed shows the placeholder until it is retried.
    pub fn is_displaying_dummy(&self) -> bool {
        self.has_load_failed() || self.displaying_dummy.load(Ordering::Acquire)
    }

    // ---- scheduling ----

    /// Schedules an asynchronous transition.
    ///
    /// Does nothing when the texture is already at, or already scheduled for,
    /// the requested residency. Otherwise exactly one unit of work is queued with
    /// the manager and the pending count grows by one.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use textures_and_passes::config::ResidencyConfig;
    /// use textures_and_passes::imp::nop::NopBackend;
    /// use textures_and_passes::pixel_formats::PixelFormatGpu;
    /// use textures_and_passes::textures::{GpuResidency, Image2, TextureGpuManager, TextureType, TransitionRequest};
    ///
    /// let manager = TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default());
    /// let texture = manager.create_texture("sprite", Default::default(), TextureType::Type2D).unwrap();
    /// let image = Arc::new(Image2::solid(8, 8, PixelFormatGpu::Rgba8Unorm, 0xff).unwrap());
    /// texture
    ///     .schedule_transition_to(TransitionRequest::new(GpuResidency::Resident).with_image(image))
    ///     .unwrap();
    /// assert_eq!(texture.pending_transitions(), 1);
    /// manager.process_queue();
    /// assert!(texture.is_data_ready());
    /// ```
    pub fn schedule_transition_to(self: &Arc<Self>, request: impl Into<TransitionRequest>) -> Result<(), Error> {
        let request = request.into();
        if self.tracker.next_residency() == request.residency {
            return Ok(());
        }
        self.schedule(request)
    }

    /// Like [`TextureGpu::schedule_transition_to`] but always queues work.
    ///
    /// The caller guarantees the request is not a duplicate. Mixing this with the
    /// checked variant on one texture can stack transitions the caller did not
    /// intend. Nothing here is memory-unsafe.
    pub fn unsafe_schedule_transition_to(
        self: &Arc<Self>,
        request: impl Into<TransitionRequest>,
    ) -> Result<(), Error> {
        self.schedule(request.into())
    }

    fn schedule(self: &Arc<Self>, request: TransitionRequest) -> Result<(), Error> {
        if self.has_load_failed() {
            return Err(Error::invalid_state(format!(
                "{} failed to load; call retry_texture_load",
                self.name
            )));
        }
        let manager = self.manager()?;
        let next = request.residency;
        logwise::trace_sync!(
            "Scheduling {name} -> {next}",
            name = logwise::privacy::LogIt(&self.name),
            next = logwise::privacy::LogIt(&next)
        );

        let cached = if next == GpuResidency::Resident
            && request.image.is_none()
            && self.residency() == GpuResidency::OnStorage
            && self.tracker.pending() == 0
            && !self.is_manual_texture()
            && self.page_out_strategy != GpuPageOutStrategy::AlwaysKeepSystemRamCopy
        {
            manager.cached_metadata(&self.name)
        } else {
            None
        };

        self.tracker.begin_preparation(next);
        let kind = match cached {
            Some(cached) => {
                // Become resident with the cached metadata now; the worker verifies it.
                let applied = self
                    .apply_metadata(&cached)
                    .and_then(|_| self.transition_to(GpuResidency::Resident, None, true));
                if let Err(err) = applied {
                    let _ = self.tracker.complete_preparation();
                    self.tracker.set_next_residency(self.residency());
                    self.tracker.wake_all();
                    return Err(err);
                }
                TransitionKind::Reload
            }
            None => TransitionKind::Residency(next),
        };
        manager.enqueue(ScheduledTransition {
            texture: self.clone(),
            kind,
            image: request.image,
            auto_delete_image: request.auto_delete_image,
            skip_multiload: request.skip_multiload,
        });
        Ok(())
    }

    /// Reloads the contents of a resident texture in place.
    ///
    /// Descriptor sets referencing the texture stay valid and keep showing the
    /// old contents until the new ones are uploaded. A texture that is not
    /// resident is scheduled to become resident instead.
    ///
    /// An explicit `image` whose format, extent, type or mip count differs from
    /// the texture's metadata is rejected with [`Error::InvalidParameters`]. When
    /// the image comes from the texture's source, a mismatch is only discovered on
    /// the worker. The worker then logs a warning, reloads the texture from
    /// scratch and notifies [`TextureChangeReason::MetadataCacheOutOfDate`].
    pub fn schedule_reupload(
        self: &Arc<Self>,
        image: Option<Arc<Image2>>,
        auto_delete_image: bool,
        skip_multiload: bool,
    ) -> Result<(), Error> {
        if self.residency() != GpuResidency::Resident || self.next_residency() != GpuResidency::Resident {
            let mut request = TransitionRequest::new(GpuResidency::Resident)
                .with_auto_delete_image(auto_delete_image)
                .with_skip_multiload(skip_multiload);
            request.image = image;
            return self.schedule_transition_to(request);
        }
        if self.has_load_failed() {
            return Err(Error::invalid_state(format!(
                "{} failed to load; call retry_texture_load",
                self.name
            )));
        }
        match &image {
            Some(image) if !self.image_matches_metadata(image) => {
                return Err(Error::invalid_parameters(format!(
                    "reupload of {} with a {} {}x{}x{} image does not match the texture",
                    self.name,
                    image.pixel_format().name(),
                    image.width(),
                    image.height(),
                    image.depth_or_slices()
                )));
            }
            None if self.is_manual_texture() => {
                return Err(Error::invalid_parameters(format!(
                    "{} is a manual texture and can only be reuploaded from an image",
                    self.name
                )));
            }
            _ => {}
        }
        let manager = self.manager()?;
        self.tracker.begin_preparation(GpuResidency::Resident);
        manager.enqueue(ScheduledTransition {
            texture: self.clone(),
            kind: TransitionKind::Reload,
            image,
            auto_delete_image,
            skip_multiload,
        });
        Ok(())
    }

    /// Clears a failed load and schedules the texture to become resident again.
    pub fn retry_texture_load(self: &Arc<Self>) -> Result<(), Error> {
        if !self.has_load_failed() {
            return Ok(());
        }
        logwise::info_sync!(
            "Retrying load of {name}",
            name = logwise::privacy::LogIt(&self.name)
        );
        self.tracker.set_load_failed(false);
        if self.residency() == GpuResidency::Resident {
            let manager = self.manager()?;
            self.tracker.begin_preparation(GpuResidency::Resident);
            manager.enqueue(ScheduledTransition {
                texture: self.clone(),
                kind: TransitionKind::Reload,
                image: None,
                auto_delete_image: true,
                skip_multiload: false,
            });
            Ok(())
        } else {
            self.unsafe_schedule_transition_to(GpuResidency::Resident)
        }
    }

    // ---- transitions ----

    /// Moves the texture to `new_residency` immediately, on the calling thread.
    ///
    /// Becoming resident validates settings, reserves a pool slot for batched
    /// textures, creates backend storage and uploads the system RAM copy if there
    /// is one. `sys_ram_copy` replaces the texture's copy. Textures with
    /// [`GpuPageOutStrategy::AlwaysKeepSystemRamCopy`] must have one. Unless
    /// the strategy keeps it or `auto_delete_sys_ram_copy` is false, the copy is
    /// released once uploaded.
    ///
    /// Leaving residency destroys backend storage.
    pub fn transition_to(
        &self,
        new_residency: GpuResidency,
        sys_ram_copy: Option<Box<[u8]>>,
        auto_delete_sys_ram_copy: bool,
    ) -> Result<(), Error> {
        let current = self.residency();
        if new_residency == current {
            return Err(Error::invalid_state(format!(
                "{} is already {current:?}",
                self.name
            )));
        }
        if let Some(copy) = &sys_ram_copy {
            let expected = self.lock_metadata().sys_ram_size_bytes();
            if copy.len() != expected {
                return Err(Error::invalid_parameters(format!(
                    "system RAM copy of {} is {} bytes, expected {expected}",
                    self.name,
                    copy.len()
                )));
            }
        }
        match new_residency {
            GpuResidency::Resident => self.become_resident(sys_ram_copy, auto_delete_sys_ram_copy)?,
            GpuResidency::OnSystemRam => self.page_to_sys_ram(current, sys_ram_copy)?,
            GpuResidency::OnStorage => self.page_to_storage(current)?,
        }
        if self.tracker.pending() == 0 {
            self.tracker.set_next_residency(new_residency);
        }
        self.tracker.wake_all();
        Ok(())
    }

    fn become_resident(&self, sys_ram_copy: Option<Box<[u8]>>, auto_delete: bool) -> Result<(), Error> {
        let keep_copy = self.page_out_strategy == GpuPageOutStrategy::AlwaysKeepSystemRamCopy;
        let has_copy = {
            let mut copy = self.sys_ram_copy.lock().expect("Failed to lock sys_ram_copy");
            if sys_ram_copy.is_some() {
                *copy = sys_ram_copy;
            }
            copy.is_some()
        };
        if keep_copy && !has_copy {
            return Err(Error::invalid_parameters(format!(
                "{} keeps a system RAM copy and cannot become resident without one",
                self.name
            )));
        }
        self.check_valid_settings()?;
        let manager = self.manager()?;

        let (requested, resolved) = {
            let mut metadata = self.lock_metadata();
            let requested = metadata.requested_sample_description;
            let resolved = manager
                .backend()
                .resolve_sample_description(requested, metadata.pixel_format);
            metadata.sample_description = resolved;
            (requested, resolved)
        };

        if self.has_automatic_batching() {
            let (pool, slice) = manager.reserve_pool_slot(self)?;
            self.notify_texture_slot_changed(Some(pool), slice);
        } else {
            let backend_texture = {
                let metadata = self.lock_metadata();
                manager.backend().create_texture(&BackendTextureDesc {
                    name: &self.name,
                    width: metadata.width,
                    height: metadata.height,
                    depth_or_slices: metadata.depth_or_slices,
                    num_mipmaps: metadata.num_mipmaps,
                    texture_type: metadata.texture_type,
                    pixel_format: metadata.pixel_format,
                    sample_description: metadata.sample_description,
                    flags: self.flags(),
                })?
            };
            let mut slot = self.backend_texture.lock().expect("Failed to lock backend_texture");
            debug_assert!(slot.is_none(), "backend storage created twice");
            *slot = Some(backend_texture);
        }
        logwise::info_sync!(
            "Created GPU storage for {name}",
            name = logwise::privacy::LogIt(&self.name)
        );

        self.displaying_dummy
            .store(!self.is_manual_texture() && self.tracker.pending() > 0, Ordering::Release);
        self.tracker.set_residency(GpuResidency::Resident);

        if has_copy {
            self.upload_sys_ram_copy()?;
            if !keep_copy && auto_delete {
                self.sys_ram_copy.lock().expect("Failed to lock sys_ram_copy").take();
            }
        }
        if requested != resolved {
            self.notify_all_listeners_texture_changed(TextureChangeReason::FsaaSettingAlteredByApi, None);
        }
        self.notify_all_listeners_texture_changed(TextureChangeReason::GainedResidency, None);
        Ok(())
    }

    fn page_to_sys_ram(&self, current: GpuResidency, sys_ram_copy: Option<Box<[u8]>>) -> Result<(), Error> {
        {
            let mut copy = self.sys_ram_copy.lock().expect("Failed to lock sys_ram_copy");
            if sys_ram_copy.is_some() {
                *copy = sys_ram_copy;
            }
            if copy.is_none() {
                return Err(Error::invalid_parameters(format!(
                    "{} needs a system RAM copy to be {:?}",
                    self.name,
                    GpuResidency::OnSystemRam
                )));
            }
        }
        if current == GpuResidency::Resident {
            self.destroy_resources()?;
            self.tracker.set_residency(GpuResidency::OnSystemRam);
            self.notify_all_listeners_texture_changed(TextureChangeReason::LostResidency, None);
        } else {
            self.tracker.set_residency(GpuResidency::OnSystemRam);
            self.notify_all_listeners_texture_changed(TextureChangeReason::FromStorageToSysRam, None);
        }
        Ok(())
    }

    fn page_to_storage(&self, current: GpuResidency) -> Result<(), Error> {
        if current == GpuResidency::Resident {
            self.destroy_resources()?;
        }
        let had_copy = self
            .sys_ram_copy
            .lock()
            .expect("Failed to lock sys_ram_copy")
            .take()
            .is_some();
        self.tracker.set_residency(GpuResidency::OnStorage);
        if current == GpuResidency::Resident {
            self.notify_all_listeners_texture_changed(TextureChangeReason::LostResidency, None);
        }
        if had_copy {
            self.notify_all_listeners_texture_changed(TextureChangeReason::FromSysRamToStorage, None);
        }
        Ok(())
    }

    fn destroy_resources(&self) -> Result<(), Error> {
        let released = self.backend_texture.lock().expect("Failed to lock backend_texture").take();
        drop(released);
        let slot = self.pool_slot.lock().expect("Failed to lock pool_slot").take();
        if let Some(slot) = slot {
            self.manager()?.release_pool_slot(slot.pool, slot.slice);
        }
        self.displaying_dummy.store(false, Ordering::Release);
        logwise::info_sync!(
            "Destroyed GPU storage for {name}",
            name = logwise::privacy::LogIt(&self.name)
        );
        Ok(())
    }

    /// Reports that a scheduled transition to `Resident` has uploaded its data.
    pub fn notify_data_is_ready(&self) -> Result<(), Error> {
        if self.residency() != GpuResidency::Resident {
            return Err(Error::invalid_state(format!(
                "{} is not resident",
                self.name
            )));
        }
        self.tracker
            .complete_preparation()
            .map_err(|_| Error::invalid_state(format!("{} has no data preparation pending", self.name)))?;
        self.displaying_dummy.store(false, Ordering::Release);
        self.notify_all_listeners_texture_changed(TextureChangeReason::ReadyForRendering, None);
        self.tracker.wake_all();
        Ok(())
    }

    /// Reports that GPU contents were downloaded into `sys_ram_copy`.
    ///
    /// With `resync_only` the texture stays resident and only its copy is
    /// replaced; pending transitions and `next_residency` are untouched.
    /// Otherwise the download completes a scheduled `Resident → OnSystemRam`
    /// transition.
    pub fn notify_sys_ram_download_is_ready(&self, sys_ram_copy: Box<[u8]>, resync_only: bool) -> Result<(), Error> {
        if resync_only {
            if self.residency() != GpuResidency::Resident {
                return Err(Error::invalid_state(format!("{} is not resident", self.name)));
            }
            let expected = self.lock_metadata().sys_ram_size_bytes();
            if sys_ram_copy.len() != expected {
                return Err(Error::invalid_parameters(format!(
                    "system RAM copy of {} is {} bytes, expected {expected}",
                    self.name,
                    sys_ram_copy.len()
                )));
            }
            self.replace_sys_ram_copy(sys_ram_copy);
            self.notify_all_listeners_texture_changed(TextureChangeReason::ResidentToSysRamSync, None);
            Ok(())
        } else {
            self.transition_to(GpuResidency::OnSystemRam, Some(sys_ram_copy), true)?;
            self.complete_transition()
        }
    }

    /// Completes a scheduled transition that needs no further notification.
    pub(crate) fn complete_transition(&self) -> Result<(), Error> {
        self.tracker
            .complete_preparation()
            .map_err(|_| Error::invalid_state(format!("{} has no transition pending", self.name)))?;
        self.tracker.wake_all();
        Ok(())
    }

    /// Drops a queued transition of a texture whose load already failed.
    pub(crate) fn abandon_transition(&self) {
        let _ = self.tracker.complete_preparation();
        if self.tracker.pending() == 0 {
            self.tracker.set_next_residency(self.residency());
        }
        self.tracker.wake_all();
    }

    pub(crate) fn replace_sys_ram_copy(&self, copy: Box<[u8]>) {
        *self.sys_ram_copy.lock().expect("Failed to lock sys_ram_copy") = Some(copy);
    }

    pub(crate) fn notify_load_failed(&self, err: &Error) {
        self.tracker.set_load_failed(true);
        if self.residency() == GpuResidency::Resident {
            self.displaying_dummy.store(true, Ordering::Release);
        }
        let _ = self.tracker.complete_preparation();
        if self.tracker.pending() == 0 {
            self.tracker.set_next_residency(self.residency());
        }
        let message = err.to_string();
        self.notify_all_listeners_texture_changed(TextureChangeReason::ExceptionThrown, Some(&message));
        self.tracker.wake_all();
    }

    /// Records which pool slice the texture occupies.
    ///
    /// Listeners receive [`TextureChangeReason::PoolTextureSlotChanged`] with the
    /// previous `(PoolId, u16)` slot as extra data, when there was one.
    pub fn notify_texture_slot_changed(&self, pool: Option<PoolId>, slice: u16) {
        let previous = {
            let mut slot = self.pool_slot.lock().expect("Failed to lock pool_slot");
            let previous = *slot;
            *slot = pool.map(|pool| PoolSlot { pool, slice });
            previous
        };
        let extra = previous.map(|p| (p.pool, p.slice));
        self.notify_all_listeners_texture_changed(
            TextureChangeReason::PoolTextureSlotChanged,
            extra.as_ref().map(|e| e as &dyn Any),
        );
    }

    // ---- metadata ----

    /// Whether geometry and format are final for the current schedule.
    pub fn is_metadata_ready(&self) -> bool {
        let pending = self.tracker.pending();
        let residency = self.tracker.residency();
        let next = self.tracker.next_residency();
        (pending == 0 && residency == next)
            || (residency == GpuResidency::Resident && next == GpuResidency::Resident)
            || (residency == GpuResidency::OnSystemRam && next != GpuResidency::OnStorage)
    }

    /// Whether the texture's data is fully available for rendering.
    ///
    /// Always true for a texture that is not resident and has nothing pending.
    pub fn is_data_ready(&self) -> bool {
        if self.has_load_failed() || self.tracker.pending() != 0 {
            return false;
        }
        if self.residency() != GpuResidency::Resident {
            return true;
        }
        !self.is_displaying_dummy()
            && self
                .with_backend(|backend, _| backend.is_data_ready())
                .unwrap_or(false)
    }

    /// Completes once metadata is ready. Fails if loading failed.
    ///
    /// Something must be processing the manager's queue, either a worker or
    /// another thread. The cost grows with this texture's position in the
    /// queue, so wait for a batch of textures together rather than one by one.
    pub async fn wait_for_metadata(&self) -> Result<(), Error> {
        self.tracker
            .wait_until(|| self.is_metadata_ready() || self.has_load_failed())
            .await;
        if self.has_load_failed() {
            return Err(Error::invalid_state(format!("{} failed to load", self.name)));
        }
        Ok(())
    }

    /// Completes once every scheduled transition finished and the GPU
    /// has consumed the uploads. Fails if loading failed.
    pub async fn wait_for_data(&self) -> Result<(), Error> {
        self.tracker
            .wait_until(|| self.tracker.pending() == 0 || self.has_load_failed())
            .await;
        self.finish_waiting_for_data()
    }

    pub(crate) fn finish_waiting_for_data(&self) -> Result<(), Error> {
        if self.has_load_failed() {
            return Err(Error::invalid_state(format!("{} failed to load", self.name)));
        }
        if self.residency() == GpuResidency::Resident {
            self.with_backend(|backend, _| backend.flush())??;
        }
        Ok(())
    }

    fn check_settable(&self) -> Result<(), Error> {
        if self.residency() != GpuResidency::OnStorage || !self.is_metadata_ready() {
            return Err(Error::invalid_state(format!(
                "metadata of {} can only change while it is {:?} with metadata ready",
                self.name,
                GpuResidency::OnStorage
            )));
        }
        Ok(())
    }

    pub fn set_resolution(&self, width: u32, height: u32, depth_or_slices: u32) -> Result<(), Error> {
        self.check_settable()?;
        let mut metadata = self.lock_metadata();
        let depth_or_slices = match metadata.texture_type {
            TextureType::TypeCube => 6,
            TextureType::TypeCubeArray if depth_or_slices % 6 != 0 => {
                return Err(Error::invalid_parameters(format!(
                    "cube array {} needs a multiple of 6 faces, got {depth_or_slices}",
                    self.name
                )));
            }
            _ => depth_or_slices,
        };
        metadata.width = width;
        metadata.height = height;
        metadata.depth_or_slices = depth_or_slices;
        Ok(())
    }

    /// Sets the format. Textures preferring sRGB get the sRGB equivalent.
    pub fn set_pixel_format(&self, pixel_format: PixelFormatGpu) -> Result<(), Error> {
        self.check_settable()?;
        self.lock_metadata().pixel_format = self.preferred_format(pixel_format);
        Ok(())
    }

    pub fn set_num_mipmaps(&self, num_mipmaps: u8) -> Result<(), Error> {
        self.check_settable()?;
        if num_mipmaps == 0 {
            return Err(Error::invalid_parameters("a texture needs at least one mipmap"));
        }
        self.lock_metadata().num_mipmaps = num_mipmaps;
        Ok(())
    }

    pub fn set_texture_type(&self, texture_type: TextureType) -> Result<(), Error> {
        self.check_settable()?;
        let mut metadata = self.lock_metadata();
        metadata.texture_type = texture_type;
        if texture_type == TextureType::TypeCube {
            metadata.depth_or_slices = 6;
        }
        Ok(())
    }

    pub fn set_sample_description(&self, sample_description: SampleDescription) -> Result<(), Error> {
        self.check_settable()?;
        let mut metadata = self.lock_metadata();
        metadata.requested_sample_description = sample_description;
        metadata.sample_description = sample_description;
        Ok(())
    }

    fn preferred_format(&self, pixel_format: PixelFormatGpu) -> PixelFormatGpu {
        if self.prefers_loading_from_file_as_srgb() {
            pixel_format.equivalent_srgb()
        } else {
            pixel_format
        }
    }

    /// Applies the metadata of a decoded image. Worker side; skips the readiness check.
    pub(crate) fn apply_image_metadata(&self, image: &Image2) -> Result<(), Error> {
        self.apply_metadata(&CachedMetadata::from_image(image))
    }

    pub(crate) fn apply_metadata(&self, cached: &CachedMetadata) -> Result<(), Error> {
        if self.residency() != GpuResidency::OnStorage {
            return Err(Error::invalid_state(format!(
                "metadata of {} can only change while it is {:?}",
                self.name,
                GpuResidency::OnStorage
            )));
        }
        let mut metadata = self.lock_metadata();
        metadata.width = cached.width;
        metadata.height = cached.height;
        metadata.depth_or_slices = cached.depth_or_slices;
        metadata.num_mipmaps = cached.num_mipmaps;
        metadata.texture_type = cached.texture_type;
        metadata.pixel_format = self.preferred_format(cached.pixel_format);
        Ok(())
    }

    pub(crate) fn image_matches_metadata(&self, image: &Image2) -> bool {
        let metadata = self.lock_metadata();
        metadata.width == image.width()
            && metadata.height == image.height()
            && metadata.depth_or_slices == image.depth_or_slices()
            && metadata.num_mipmaps == image.num_mipmaps()
            && metadata.texture_type == image.texture_type()
            && metadata.pixel_format == self.preferred_format(image.pixel_format())
    }

    /// Verifies that geometry, format and flags form a valid texture.
    pub fn check_valid_settings(&self) -> Result<(), Error> {
        let metadata = self.metadata();
        let flags = self.flags();
        let fail = |msg: &str| Err(Error::invalid_parameters(format!("{}: {msg}", self.name)));

        if metadata.width == 0 || metadata.height == 0 || metadata.depth_or_slices == 0 {
            return fail("resolution has a zero dimension");
        }
        if metadata.pixel_format == PixelFormatGpu::Unknown {
            return fail("pixel format is not set");
        }
        if metadata.texture_type == TextureType::Unknown {
            return fail("texture type is not set");
        }
        if matches!(metadata.texture_type, TextureType::Type1D | TextureType::Type1DArray) && metadata.height != 1 {
            return fail("1D textures must have a height of 1");
        }
        if metadata.texture_type == TextureType::TypeCube && metadata.depth_or_slices != 6 {
            return fail("cubemaps must have 6 faces");
        }
        if metadata.texture_type == TextureType::TypeCubeArray && metadata.depth_or_slices % 6 != 0 {
            return fail("cubemap arrays need a multiple of 6 faces");
        }
        let depth = if metadata.texture_type.has_slices() { 1 } else { metadata.depth_or_slices };
        if metadata.num_mipmaps == 0 || metadata.num_mipmaps > max_mipmaps(metadata.width, metadata.height, depth) {
            return fail("mipmap count exceeds what the resolution allows");
        }
        if metadata.requested_sample_description.is_multisample() {
            if metadata.num_mipmaps > 1 {
                return fail("multisampled textures cannot have mipmaps");
            }
            if !matches!(metadata.texture_type, TextureType::Type2D | TextureType::Type2DArray) {
                return fail("multisampling is only supported on 2D and 2D array textures");
            }
            if flags.contains(TextureFlags::AUTOMATIC_BATCHING) {
                return fail("multisampled textures cannot be batched");
            }
            if !flags.intersects(TextureFlags::RENDER_TO_TEXTURE | TextureFlags::UAV) {
                return fail("multisampled textures must be render targets or UAVs");
            }
        } else if flags.contains(TextureFlags::MSAA_EXPLICIT_RESOLVE) {
            return fail("explicit resolves require a multisampled texture");
        }
        if flags.contains(TextureFlags::UAV)
            && (metadata.pixel_format.is_compressed() || metadata.pixel_format.is_depth())
        {
            return fail("UAV textures cannot use compressed or depth formats");
        }
        if flags.contains(TextureFlags::ALLOW_AUTOMIPMAPS)
            && !flags.intersects(TextureFlags::RENDER_TO_TEXTURE | TextureFlags::UAV)
        {
            return fail("automipmaps require a render target or UAV");
        }
        if flags.contains(TextureFlags::AUTOMIPMAPS_AUTO) && !flags.contains(TextureFlags::ALLOW_AUTOMIPMAPS) {
            return fail("automatic mipmap generation requires ALLOW_AUTOMIPMAPS");
        }
        if flags.contains(TextureFlags::AUTOMATIC_BATCHING)
            && (metadata.texture_type != TextureType::Type2D
                || flags.intersects(TextureFlags::RENDER_TO_TEXTURE | TextureFlags::UAV))
        {
            return fail("automatic batching is only supported on sampled 2D textures");
        }
        if flags.contains(TextureFlags::TILER_MEMORYLESS) {
            if !flags.contains(TextureFlags::RENDER_TO_TEXTURE) || flags.contains(TextureFlags::UAV) {
                return fail("tiler memoryless textures must be render targets and cannot be UAVs");
            }
            if self.page_out_strategy == GpuPageOutStrategy::AlwaysKeepSystemRamCopy {
                return fail("tiler memoryless textures cannot keep a system RAM copy");
            }
        }
        Ok(())
    }

    /// A snapshot of geometry and format.
    pub fn metadata(&self) -> TextureMetadata {
        self.lock_metadata().clone()
    }

    pub fn width(&self) -> u32 {
        self.lock_metadata().width
    }

    pub fn height(&self) -> u32 {
        self.lock_metadata().height
    }

    pub fn depth_or_slices(&self) -> u32 {
        self.lock_metadata().depth_or_slices
    }

    /// Depth of a 3D texture; 1 for every other type.
    pub fn depth(&self) -> u32 {
        let metadata = self.lock_metadata();
        if metadata.texture_type == TextureType::Type3D {
            metadata.depth_or_slices
        } else {
            1
        }
    }

    /// Array slices (or cube faces); 1 for 3D textures.
    pub fn num_slices(&self) -> u32 {
        let metadata = self.lock_metadata();
        if metadata.texture_type == TextureType::Type3D {
            1
        } else {
            metadata.depth_or_slices
        }
    }

    pub fn num_mipmaps(&self) -> u8 {
        self.lock_metadata().num_mipmaps
    }

    pub fn texture_type(&self) -> TextureType {
        self.lock_metadata().texture_type
    }

    /// The type of the underlying storage. Batched textures live in a 2D array.
    pub fn internal_texture_type(&self) -> TextureType {
        if self.texture_pool().is_some() {
            TextureType::Type2DArray
        } else {
            self.texture_type()
        }
    }

    pub fn pixel_format(&self) -> PixelFormatGpu {
        self.lock_metadata().pixel_format
    }

    pub fn sample_description(&self) -> SampleDescription {
        self.lock_metadata().sample_description
    }

    pub fn requested_sample_description(&self) -> SampleDescription {
        self.lock_metadata().requested_sample_description
    }

    pub fn is_multisample(&self) -> bool {
        self.sample_description().is_multisample()
    }

    /// The pool a batched texture lives in.
    pub fn texture_pool(&self) -> Option<PoolId> {
        self.pool_slot.lock().expect("Failed to lock pool_slot").map(|slot| slot.pool)
    }

    /// First slice of the storage this texture occupies; 0 unless batched.
    pub fn internal_slice_start(&self) -> u16 {
        self.pool_slot
            .lock()
            .expect("Failed to lock pool_slot")
            .map(|slot| slot.slice)
            .unwrap_or(0)
    }

    /// Whether this texture can be the depth buffer of `colour_target`.
    pub fn supports_as_depth_buffer_for(&self, colour_target: &TextureGpu) -> bool {
        let depth = self.metadata();
        let colour = colour_target.metadata();
        depth.width == colour.width
            && depth.height == colour.height
            && depth.sample_description == colour.sample_description
            && self.is_render_window_specific() == colour_target.is_render_window_specific()
    }

    // ---- flags ----

    pub fn is_texture(&self) -> bool {
        !self.flags().contains(TextureFlags::NOT_TEXTURE)
    }

    pub fn is_render_to_texture(&self) -> bool {
        self.flags().contains(TextureFlags::RENDER_TO_TEXTURE)
    }

    pub fn is_uav(&self) -> bool {
        self.flags().contains(TextureFlags::UAV)
    }

    pub fn allows_auto_mipmaps(&self) -> bool {
        self.flags().contains(TextureFlags::ALLOW_AUTOMIPMAPS)
    }

    pub fn has_auto_mipmap_auto(&self) -> bool {
        self.flags().contains(TextureFlags::AUTOMIPMAPS_AUTO)
    }

    pub fn has_msaa_explicit_resolves(&self) -> bool {
        self.flags().contains(TextureFlags::MSAA_EXPLICIT_RESOLVE)
    }

    pub fn is_reinterpretable(&self) -> bool {
        self.flags().contains(TextureFlags::REINTERPRETABLE)
    }

    pub fn prefers_loading_from_file_as_srgb(&self) -> bool {
        self.flags().contains(TextureFlags::PREFERS_LOADING_FROM_FILE_AS_SRGB)
    }

    pub fn is_render_window_specific(&self) -> bool {
        self.flags().contains(TextureFlags::RENDER_WINDOW_SPECIFIC)
    }

    pub fn requires_texture_flipping(&self) -> bool {
        self.flags().contains(TextureFlags::REQUIRES_TEXTURE_FLIPPING)
    }

    pub fn is_manual_texture(&self) -> bool {
        self.flags().contains(TextureFlags::MANUAL_TEXTURE)
    }

    pub fn has_automatic_batching(&self) -> bool {
        self.flags().contains(TextureFlags::AUTOMATIC_BATCHING)
    }

    pub fn is_pool_owner(&self) -> bool {
        self.flags().contains(TextureFlags::POOL_OWNER)
    }

    pub fn is_discardable_content(&self) -> bool {
        self.flags().contains(TextureFlags::DISCARDABLE_CONTENT)
    }

    pub fn is_tiler_memoryless(&self) -> bool {
        self.flags().contains(TextureFlags::TILER_MEMORYLESS)
    }

    pub fn is_tiler_depth_memoryless(&self) -> bool {
        self.flags().contains(TextureFlags::TILER_DEPTH_MEMORYLESS)
    }

    // ---- data ----

    /// Runs `f` with the storage holding this texture and the slice offset of
    /// the texture inside it.
    fn with_backend<R>(&self, f: impl FnOnce(&dyn BackendTexture, u32) -> R) -> Result<R, Error> {
        let slot = *self.pool_slot.lock().expect("Failed to lock pool_slot");
        let master;
        let (owner, slice_offset): (&TextureGpu, u32) = match slot {
            Some(slot) => {
                master = self.manager()?.pool_master(slot.pool)?;
                (&*master, slot.slice as u32)
            }
            None => (self, 0),
        };
        let guard = owner.backend_texture.lock().expect("Failed to lock backend_texture");
        let backend = guard
            .as_deref()
            .ok_or_else(|| Error::invalid_state(format!("{} has no GPU storage", owner.name)))?;
        Ok(f(backend, slice_offset))
    }

    /// Uploads every mip of `image`.
    pub(crate) fn upload_image(&self, image: &Image2) -> Result<(), Error> {
        let metadata = self.metadata();
        for mip in 0..image.num_mipmaps().min(metadata.num_mipmaps) {
            let data = image.mip_data(mip)?;
            self.upload_mip(&metadata, mip, data, image.bytes_per_row(mip))?;
        }
        Ok(())
    }

    fn upload_mip(&self, metadata: &TextureMetadata, mip: u8, data: &[u8], bytes_per_row: usize) -> Result<(), Error> {
        self.with_backend(|backend, slice_offset| {
            let mut region = metadata.mip_box(mip);
            region.front += slice_offset;
            region.back += slice_offset;
            backend.upload(mip, &region, data, bytes_per_row)
        })?
    }

    fn upload_sys_ram_copy(&self) -> Result<(), Error> {
        let metadata = self.metadata();
        let copy = self.sys_ram_copy.lock().expect("Failed to lock sys_ram_copy");
        let Some(copy) = copy.as_ref() else {
            return Ok(());
        };
        let mut offset = 0;
        for mip in 0..metadata.num_mipmaps {
            let size = metadata.mip_size_bytes(mip);
            let bytes_per_row = metadata
                .pixel_format
                .bytes_per_row(mip_extent(metadata.width, mip), SYS_RAM_ROW_ALIGNMENT);
            self.upload_mip(&metadata, mip, &copy[offset..offset + size], bytes_per_row)?;
            offset += size;
        }
        Ok(())
    }

    /// Downloads the whole mip chain in system RAM copy layout.
    pub(crate) fn download_all(&self) -> Result<Box<[u8]>, Error> {
        let metadata = self.metadata();
        let mut out = Vec::with_capacity(metadata.sys_ram_size_bytes());
        for mip in 0..metadata.num_mipmaps {
            let bytes_per_row = metadata
                .pixel_format
                .bytes_per_row(mip_extent(metadata.width, mip), SYS_RAM_ROW_ALIGNMENT);
            let data = self.with_backend(|backend, slice_offset| {
                let mut region = metadata.mip_box(mip);
                region.front += slice_offset;
                region.back += slice_offset;
                backend.read_back(mip, &region, bytes_per_row)
            })??;
            out.extend_from_slice(&data);
        }
        Ok(out.into_boxed_slice())
    }

    pub fn has_sys_ram_copy(&self) -> bool {
        self.sys_ram_copy.lock().expect("Failed to lock sys_ram_copy").is_some()
    }

    /// A copy of the system RAM copy of `mip`, all slices, rows padded to
    /// [`SYS_RAM_ROW_ALIGNMENT`].
    pub fn sys_ram_copy(&self, mip: u8) -> Option<Vec<u8>> {
        let metadata = self.metadata();
        if mip >= metadata.num_mipmaps {
            return None;
        }
        let offset: usize = (0..mip).map(|m| metadata.mip_size_bytes(m)).sum();
        let size = metadata.mip_size_bytes(mip);
        self.sys_ram_copy
            .lock()
            .expect("Failed to lock sys_ram_copy")
            .as_ref()
            .map(|copy| copy[offset..offset + size].to_vec())
    }

    /// Copies a region of this texture into `dst`.
    ///
    /// Both textures must be resident, the boxes must have equal size and lie
    /// inside their mips, and the formats must be copy-compatible. Afterwards
    /// a multisampled destination without explicit resolves is resolved (when
    /// [`TextureCopy::keep_resolved_tex_synced`] is set), destinations with
    /// automatic mipmaps are regenerated, and destinations that keep a system RAM
    /// copy resynchronize it.
    ///
    /// See [`ResourceTransitionMode`](super::ResourceTransitionMode) for the
    /// hazard of manual transitions across overlapping copies.
    pub fn copy_to(&self, dst: &TextureGpu, copy: &TextureCopy) -> Result<(), Error> {
        for texture in [self, dst] {
            if texture.residency() != GpuResidency::Resident {
                return Err(Error::invalid_state(format!("{} is not resident", texture.name)));
            }
        }
        let src_meta = self.metadata();
        let dst_meta = dst.metadata();
        if copy.src_mip() >= src_meta.num_mipmaps || copy.dst_mip() >= dst_meta.num_mipmaps {
            return Err(Error::invalid_parameters("copy mip level out of range"));
        }
        if !copy.src_box().equal_size(&copy.dst_box()) {
            return Err(Error::invalid_parameters("copy source and destination differ in size"));
        }
        if !src_meta.mip_box(copy.src_mip()).contains(&copy.src_box())
            || !dst_meta.mip_box(copy.dst_mip()).contains(&copy.dst_box())
        {
            return Err(Error::invalid_parameters("copy region exceeds the texture"));
        }
        if !src_meta.pixel_format.is_copy_compatible(dst_meta.pixel_format) {
            return Err(Error::invalid_parameters(format!(
                "cannot copy {} texels into {}",
                src_meta.pixel_format.name(),
                dst_meta.pixel_format.name()
            )));
        }
        if src_meta.sample_description != dst_meta.sample_description {
            return Err(Error::invalid_parameters("copy between different sample descriptions"));
        }
        if self.id == dst.id && copy.src_mip() == copy.dst_mip() && copy.src_box().overlaps(&copy.dst_box()) {
            return Err(Error::invalid_parameters("copy source and destination overlap"));
        }
        if copy.src_transition_mode() == super::ResourceTransitionMode::AlreadyInLayoutThenManual
            || copy.dst_transition_mode() == super::ResourceTransitionMode::AlreadyInLayoutThenManual
        {
            logwise::trace_sync!(
                "Copy {src} -> {dst} leaves layout transitions to the caller",
                src = logwise::privacy::LogIt(&self.name),
                dst = logwise::privacy::LogIt(&dst.name)
            );
        }

        let src_master = self.pool_master()?;
        let dst_master = dst.pool_master()?;
        let src_owner: &TextureGpu = src_master.as_deref().unwrap_or(self);
        let dst_owner: &TextureGpu = dst_master.as_deref().unwrap_or(dst);
        let offset_copy = copy.offset_slices(
            self.internal_slice_start() as u32,
            dst.internal_slice_start() as u32,
        );
        if std::ptr::eq(src_owner, dst_owner) {
            src_owner.with_backend(|backend, _| backend.copy_to(backend, &offset_copy))??;
        } else if src_owner.id < dst_owner.id {
            src_owner.with_backend(|src_backend, _| {
                dst_owner.with_backend(|dst_backend, _| src_backend.copy_to(dst_backend, &offset_copy))
            })???;
        } else {
            dst_owner.with_backend(|dst_backend, _| {
                src_owner.with_backend(|src_backend, _| src_backend.copy_to(dst_backend, &offset_copy))
            })???;
        }

        if dst_meta.sample_description.is_multisample()
            && !dst.has_msaa_explicit_resolves()
            && copy.keep_resolved_tex_synced()
        {
            dst.with_backend(|backend, _| backend.resolve())??;
        }
        if dst.allows_auto_mipmaps() && dst.has_auto_mipmap_auto() && copy.dst_mip() == 0 {
            dst.with_backend(|backend, _| backend.generate_mipmaps())??;
        }
        if dst.page_out_strategy == GpuPageOutStrategy::AlwaysKeepSystemRamCopy {
            dst.notify_sys_ram_download_is_ready(dst.download_all()?, true)?;
        }
        Ok(())
    }

    fn pool_master(&self) -> Result<Option<Arc<TextureGpu>>, Error> {
        match self.texture_pool() {
            Some(pool) => Ok(Some(self.manager()?.pool_master(pool)?)),
            None => Ok(None),
        }
    }

    /// Reads `src_box` of `mip` back to the CPU, rows padded to [`SYS_RAM_ROW_ALIGNMENT`].
    ///
    /// Waits for pending transitions and GPU work first.
    pub async fn copy_contents_to_memory(&self, src_box: TexelBox, mip: u8) -> Result<Vec<u8>, Error> {
        self.wait_for_data().await?;
        if self.residency() != GpuResidency::Resident {
            return Err(Error::invalid_state(format!("{} is not resident", self.name)));
        }
        let metadata = self.metadata();
        if mip >= metadata.num_mipmaps {
            return Err(Error::invalid_parameters(format!("{} has no mip {mip}", self.name)));
        }
        if !metadata.mip_box(mip).contains(&src_box) {
            return Err(Error::invalid_parameters("readback region exceeds the texture"));
        }
        let bytes_per_row = metadata
            .pixel_format
            .bytes_per_row(src_box.width(), SYS_RAM_ROW_ALIGNMENT);
        self.with_backend(|backend, slice_offset| {
            let mut region = src_box;
            region.front += slice_offset;
            region.back += slice_offset;
            backend.read_back(mip, &region, bytes_per_row)
        })?
    }

    /// Writes mips `min_mip..=max_mip` of the first slice as PNG files.
    ///
    /// `min_mip` goes to `path`. Each further mip goes next to it with a
    /// `_mip{N}` suffix on the file stem.
    pub async fn write_contents_to_file(&self, path: impl AsRef<Path>, min_mip: u8, max_mip: u8) -> Result<(), Error> {
        let path = path.as_ref();
        self.wait_for_data().await?;
        let metadata = self.metadata();
        if min_mip > max_mip || min_mip >= metadata.num_mipmaps {
            return Err(Error::invalid_parameters(format!(
                "mip range {min_mip}..={max_mip} is invalid for {}",
                self.name
            )));
        }
        for mip in min_mip..=max_mip.min(metadata.num_mipmaps - 1) {
            let width = mip_extent(metadata.width, mip);
            let height = mip_extent(metadata.height, mip);
            let data = self
                .copy_contents_to_memory(TexelBox::full(width, height, 1), mip)
                .await?;
            let file_path = if mip == min_mip {
                path.to_path_buf()
            } else {
                let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
                path.with_file_name(format!("{stem}_mip{mip}.png"))
            };
            let file = std::io::BufWriter::new(std::fs::File::create(&file_path)?);
            crate::pixel_formats::png_support::encode_png(
                file,
                width,
                height,
                metadata.pixel_format,
                &data,
                metadata.pixel_format.bytes_per_row(width, SYS_RAM_ROW_ALIGNMENT),
            )?;
        }
        Ok(())
    }

    // ---- listeners ----

    pub fn add_listener(&self, listener: Arc<dyn TextureGpuListener>) {
        self.listeners.lock().expect("Failed to lock listeners").push(listener);
    }

    /// Removes a previously added listener. Returns whether it was registered.
    pub fn remove_listener(&self, listener: &Arc<dyn TextureGpuListener>) -> bool {
        let mut listeners = self.listeners.lock().expect("Failed to lock listeners");
        let target = Arc::as_ptr(listener) as *const ();
        match listeners.iter().position(|l| Arc::as_ptr(l) as *const () == target) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().expect("Failed to lock listeners").len()
    }

    pub(crate) fn clear_listeners(&self) {
        self.listeners.lock().expect("Failed to lock listeners").clear();
    }

    /// Delivers `reason` to every listener on the calling thread.
    ///
    /// Iterates over a snapshot, so listeners may add or remove listeners
    /// from inside the callback.
    pub fn notify_all_listeners_texture_changed(&self, reason: TextureChangeReason, extra_data: Option<&dyn Any>) {
        let snapshot = self.listeners.lock().expect("Failed to lock listeners").clone();
        for listener in snapshot {
            listener.notify_texture_changed(self, reason, extra_data);
        }
    }

    /// Whether any listener wants this texture kept loaded.
    pub fn should_stay_loaded(&self) -> bool {
        let snapshot = self.listeners.lock().expect("Failed to lock listeners").clone();
        snapshot.iter().any(|listener| listener.should_stay_loaded(self))
    }

    pub(crate) fn tracker(&self) -> &ResidencyTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResidencyConfig;
    use crate::imp::nop::NopBackend;
    use crate::textures::{MsaaPattern, TextureGpuManager};

    fn manager() -> TextureGpuManager {
        TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn render_targets_are_manual() {
        let manager = manager();
        for flag in [TextureFlags::NOT_TEXTURE, TextureFlags::RENDER_TO_TEXTURE, TextureFlags::UAV] {
            let texture = manager
                .create_texture(&format!("rt{:?}", flag), flag, TextureType::Type2D)
                .unwrap();
            assert!(texture.is_manual_texture());
        }
        let plain = manager
            .create_texture("plain", TextureFlags::empty(), TextureType::Type2D)
            .unwrap();
        assert!(!plain.is_manual_texture());
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn setters_require_on_storage() {
        let manager = manager();
        let texture = manager
            .create_texture("rt", TextureFlags::RENDER_TO_TEXTURE, TextureType::Type2D)
            .unwrap();
        texture.set_resolution(16, 16, 1).unwrap();
        texture.set_pixel_format(PixelFormatGpu::Rgba8Unorm).unwrap();
        texture.transition_to(GpuResidency::Resident, None, true).unwrap();
        let err = texture.set_resolution(32, 32, 1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidState);
        assert_eq!(texture.width(), 16);
        texture.transition_to(GpuResidency::OnStorage, None, true).unwrap();
        texture.set_resolution(32, 32, 1).unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn srgb_preference_and_cubes() {
        let manager = manager();
        let texture = manager
            .create_texture(
                "srgb",
                TextureFlags::PREFERS_LOADING_FROM_FILE_AS_SRGB,
                TextureType::TypeCube,
            )
            .unwrap();
        texture.set_pixel_format(PixelFormatGpu::Rgba8Unorm).unwrap();
        assert_eq!(texture.pixel_format(), PixelFormatGpu::Rgba8UnormSrgb);
        texture.set_resolution(4, 4, 1).unwrap();
        assert_eq!(texture.num_slices(), 6);
        assert_eq!(texture.depth(), 1);

        let array = manager
            .create_texture("cubes", TextureFlags::empty(), TextureType::TypeCubeArray)
            .unwrap();
        assert!(array.set_resolution(4, 4, 7).is_err());
        array.set_resolution(4, 4, 12).unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn invalid_settings_are_reported() {
        let manager = manager();
        let texture = manager
            .create_texture("msaa", TextureFlags::empty(), TextureType::Type2D)
            .unwrap();
        texture.set_resolution(8, 8, 1).unwrap();
        texture.set_pixel_format(PixelFormatGpu::Rgba8Unorm).unwrap();
        texture
            .set_sample_description(SampleDescription::new(4, MsaaPattern::Standard))
            .unwrap();
        // multisampled but neither a render target nor a UAV
        assert!(texture.check_valid_settings().is_err());
        let err = texture
            .transition_to(GpuResidency::Resident, None, true)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidParameters);
        assert_eq!(texture.residency(), GpuResidency::OnStorage);

        let mips = manager
            .create_texture("mips", TextureFlags::empty(), TextureType::Type2D)
            .unwrap();
        mips.set_resolution(4, 4, 1).unwrap();
        mips.set_pixel_format(PixelFormatGpu::Rgba8Unorm).unwrap();
        mips.set_num_mipmaps(4).unwrap();
        assert!(mips.check_valid_settings().is_err());
        mips.set_num_mipmaps(3).unwrap();
        mips.check_valid_settings().unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn depth_buffer_compatibility() {
        let manager = manager();
        let make = |name: &str, w: u32, format: PixelFormatGpu| {
            let t = manager
                .create_texture(name, TextureFlags::RENDER_TO_TEXTURE, TextureType::Type2D)
                .unwrap();
            t.set_resolution(w, 64, 1).unwrap();
            t.set_pixel_format(format).unwrap();
            t
        };
        let colour = make("colour", 64, PixelFormatGpu::Rgba8Unorm);
        let depth = make("depth", 64, PixelFormatGpu::D32Float);
        let small = make("small", 32, PixelFormatGpu::D32Float);
        assert!(depth.supports_as_depth_buffer_for(&colour));
        assert!(!small.supports_as_depth_buffer_for(&colour));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn unscheduled_transitions_keep_metadata_ready() {
        let manager = manager();
        let texture = manager
            .create_texture("rt", TextureFlags::RENDER_TO_TEXTURE, TextureType::Type2D)
            .unwrap();
        texture.set_resolution(8, 8, 1).unwrap();
        texture.set_pixel_format(PixelFormatGpu::Rgba8Unorm).unwrap();
        texture.transition_to(GpuResidency::Resident, None, true).unwrap();
        assert_eq!(texture.next_residency(), GpuResidency::Resident);
        assert!(texture.is_metadata_ready());
        assert!(texture.is_data_ready());
        assert!(!texture.is_displaying_dummy());
        let err = texture
            .transition_to(GpuResidency::Resident, None, true)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidState);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn rejected_early_residency_wakes_waiters() {
        use futures::FutureExt;
        let manager = manager();
        manager.import_metadata_cache([(
            "sketch".to_string(),
            CachedMetadata {
                width: 8,
                height: 8,
                depth_or_slices: 1,
                num_mipmaps: 1,
                texture_type: TextureType::Type2D,
                pixel_format: PixelFormatGpu::Rgba8Unorm,
            },
        )]);
        // automipmaps without a render target fail validation once the cached metadata is applied
        let texture = manager
            .create_texture("sketch", TextureFlags::ALLOW_AUTOMIPMAPS, TextureType::Type2D)
            .unwrap();
        assert!(texture.tracker.wait_until(|| false).now_or_never().is_none());
        assert_eq!(texture.tracker.waiters(), 1);

        let err = texture.schedule_transition_to(GpuResidency::Resident).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidParameters);
        assert_eq!(texture.tracker.waiters(), 0);
        assert_eq!(texture.pending_transitions(), 0);
        assert_eq!(texture.next_residency(), GpuResidency::OnStorage);
        assert_eq!(manager.pending_requests(), 0);
        assert!(texture.is_metadata_ready());
    }
}
