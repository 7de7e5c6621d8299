// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
GPU textures and their residency.

A [`TextureGpu`] is created through a [`TextureGpuManager`] and moves between
three residencies:

```text
OnStorage ──▶ OnSystemRam ──▶ Resident
    ▲              │              │
    └──────────────┴──────────────┘
```

Transitions are scheduled on the texture and executed by the manager, on the
caller's thread via [`TextureGpuManager::process_queue`] or on a worker via
[`TextureGpuManager::start_worker`]. Listeners attached to a texture observe
every change.
*/

mod copy;
mod image;
mod listener;
mod manager;
mod pool;
mod residency_tracking;
mod texel_box;
mod texture_builder;
mod texture_gpu;
mod types;

pub use copy::{ResourceTransitionMode, TextureCopy};
pub use image::{CodecRegistry, FileSystemSource, Image2, ImageCodec, ImageLoader, ImageSource, InMemorySource};
pub use listener::{TextureChangeReason, TextureGpuListener};
pub use manager::{CachedMetadata, TextureGpuManager, WorkerHandle};
pub use pool::{PoolId, TexturePoolInfo};
pub use texel_box::TexelBox;
pub use texture_builder::TextureGpuBuilder;
pub use texture_gpu::{TextureGpu, TextureId, TextureMetadata, TransitionRequest};
pub use types::{GpuPageOutStrategy, GpuResidency, MsaaPattern, SampleDescription, TextureFlags, TextureType};
