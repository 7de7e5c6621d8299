// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! textures_and_passes tracks where GPU textures live and validates how they are bound and rendered to.

The crate is the resource bookkeeping layer underneath a renderer. It does not
draw anything itself; it answers three questions a renderer asks constantly.

| Question                                     | Module            | Main types                                                        |
|----------------------------------------------|-------------------|-------------------------------------------------------------------|
| Is this texture loaded, and where?           | [`textures`]      | [`TextureGpu`](textures::TextureGpu), [`TextureGpuManager`](textures::TextureGpuManager) |
| Can these resources be bound together?       | [`bindings`]      | [`DescriptorSetTexture2`](bindings::DescriptorSetTexture2), [`DescriptorSetUav`](bindings::DescriptorSetUav) |
| Can a pass render into these attachments?    | [`passes`]        | [`RenderPassDescriptor`](passes::RenderPassDescriptor), [`FrameBufferDescKey`](passes::FrameBufferDescKey) |

# Residency

Every texture is in one of three residencies: `OnStorage` (nothing loaded),
`OnSystemRam` (a CPU copy exists) or `Resident` (GPU storage exists). Moving
between them is scheduled on the texture and carried out by the manager, either
on the caller's thread or on a worker thread. Waiting for a texture is `async`.

```
use std::sync::Arc;
use textures_and_passes::config::ResidencyConfig;
use textures_and_passes::imp::nop::NopBackend;
use textures_and_passes::pixel_formats::PixelFormatGpu;
use textures_and_passes::textures::{GpuResidency, Image2, TextureGpuManager, TextureType, TransitionRequest};

let manager = TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default());
let texture = manager.texture("checker", TextureType::Type2D).build().unwrap();
let image = Arc::new(Image2::solid(256, 256, PixelFormatGpu::Rgba8Unorm, 0xff).unwrap());
texture
    .schedule_transition_to(TransitionRequest::new(GpuResidency::Resident).with_image(image))
    .unwrap();
manager.process_queue();
assert!(texture.is_data_ready());
assert_eq!(texture.width(), 256);
```

# Backends

GPU work goes through the [`GpuTextureBackend`](imp::GpuTextureBackend) trait.
[`imp::nop`] keeps texel data in memory and is what the tests run against. The
`backend_wgpu` feature (on by default) adds a [wgpu](https://wgpu.rs) backend.

# Errors and logging

Fallible operations return [`error::Error`]. Validation failures are reported at
the offending call and never leave partial state behind. Lifecycle events are
logged through [logwise](https://docs.rs/logwise).
*/

pub mod bindings;
pub mod config;
pub mod error;
pub mod imp;
pub mod passes;
pub mod pixel_formats;
pub mod textures;
