// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Runtime configuration for [`TextureGpuManager`](crate::textures::TextureGpuManager).

Settings that would otherwise be process-wide mutable defaults are collected here
and handed to the manager when it is created. Every texture created by that
manager observes the same configuration for its whole lifetime.

# Examples

```
use textures_and_passes::config::{OrientationMode, ResidencyConfig};
use textures_and_passes::textures::GpuPageOutStrategy;

let config = ResidencyConfig {
    default_page_out_strategy: GpuPageOutStrategy::SaveToSystemRam,
    render_target_orientation: OrientationMode::Flipped,
    ..ResidencyConfig::default()
};
assert_eq!(config.pool_slices, 16);
```
*/

use crate::textures::GpuPageOutStrategy;

/// How render targets are addressed vertically by the active backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrientationMode {
    /// Row zero is the top of the image.
    #[default]
    Normal,
    /// Row zero is the bottom of the image. Render-to-texture textures created
    /// under this mode are flagged as requiring texture flipping.
    Flipped,
}

/// Configuration injected into a texture manager.
#[derive(Debug, Clone)]
pub struct ResidencyConfig {
    /// Page-out strategy for textures whose builder does not set one.
    pub default_page_out_strategy: GpuPageOutStrategy,
    /// Vertical addressing of render targets.
    pub render_target_orientation: OrientationMode,
    /// Number of array slices in each texture pool created for automatic batching.
    pub pool_slices: u16,
    /// Decode queued images in parallel before executing their transitions.
    pub multiload: bool,
    /// Remember the metadata of loaded textures so later loads can become
    /// resident before their data has been decoded.
    pub use_metadata_cache: bool,
}

impl Default for ResidencyConfig {
    fn default() -> Self {
        ResidencyConfig {
            default_page_out_strategy: GpuPageOutStrategy::Discard,
            render_target_orientation: OrientationMode::Normal,
            pool_slices: 16,
            multiload: true,
            use_metadata_cache: true,
        }
    }
}
