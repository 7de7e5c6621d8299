// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::any::Any;

use super::TextureGpu;

/// Why a texture notified its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureChangeReason {
    /// Loaded from its source into a system RAM copy.
    FromStorageToSysRam,
    /// The system RAM copy was released.
    FromSysRamToStorage,
    /// GPU resources were created.
    GainedResidency,
    /// GPU resources were destroyed.
    LostResidency,
    /// The texture moved to another slice or pool. Extra data is the previous
    /// `(PoolId, slice)` when one existed.
    PoolTextureSlotChanged,
    /// The system RAM copy was refreshed from GPU contents.
    ResidentToSysRamSync,
    /// Metadata applied from the cache did not match the loaded image.
    MetadataCacheOutOfDate,
    /// Loading failed. Extra data is the error message as a `String`.
    ExceptionThrown,
    /// The backend chose a different sample description than requested.
    FsaaSettingAlteredByApi,
    /// Data finished uploading and the texture no longer shows the dummy.
    ReadyForRendering,
    /// Views of the texture must be recreated.
    ShaderViewsChanged,
    /// The texture is being destroyed.
    Deleted,
}

impl TextureChangeReason {
    /// Whether descriptors built from the texture are stale after this change.
    pub fn invalidates_views(self) -> bool {
        matches!(
            self,
            TextureChangeReason::GainedResidency
                | TextureChangeReason::LostResidency
                | TextureChangeReason::PoolTextureSlotChanged
                | TextureChangeReason::MetadataCacheOutOfDate
                | TextureChangeReason::FsaaSettingAlteredByApi
                | TextureChangeReason::ShaderViewsChanged
                | TextureChangeReason::Deleted
        )
    }
}

/// Receives change notifications from textures it has been added to.
///
/// Notifications are delivered synchronously on the thread that changed the
/// texture. A listener may add or remove listeners from inside the callback.
pub trait TextureGpuListener: Send + Sync {
    fn notify_texture_changed(
        &self,
        texture: &TextureGpu,
        reason: TextureChangeReason,
        extra_data: Option<&dyn Any>,
    );

    /// Return true to keep [`TextureGpuManager::destroy_texture`](super::TextureGpuManager::destroy_texture)
    /// from destroying the texture. Scheduled page-outs are not affected.
    fn should_stay_loaded(&self, _texture: &TextureGpu) -> bool {
        false
    }
}
