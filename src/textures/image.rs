// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Decoded image input.

A texture that is loaded rather than rendered to receives its contents as an
[`Image2`]: a decoded image with its format, extent and mip chain laid out
contiguously. Decoding goes through a [`CodecRegistry`]. The registry is
created and initialized explicitly and handed to the manager; there is no
global codec state.
*/

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::pixel_formats::{PixelFormatGpu, SYS_RAM_ROW_ALIGNMENT, max_mipmaps, mip_extent};
use crate::pixel_formats::png_support::PngCodec;

use super::TextureType;

/// A decoded image.
///
/// Mip levels are stored one after another. Each level holds every slice (or
/// depth layer) with rows padded to [`SYS_RAM_ROW_ALIGNMENT`].
#[derive(Debug, Clone, PartialEq)]
pub struct Image2 {
    width: u32,
    height: u32,
    depth_or_slices: u32,
    num_mipmaps: u8,
    texture_type: TextureType,
    pixel_format: PixelFormatGpu,
    data: Box<[u8]>,
}

impl Image2 {
    /// Wraps decoded texels.
    ///
    /// Fails with [`Error::InvalidParameters`] when `data` does not match the
    /// layout implied by the other arguments.
    pub fn new(
        width: u32,
        height: u32,
        depth_or_slices: u32,
        num_mipmaps: u8,
        texture_type: TextureType,
        pixel_format: PixelFormatGpu,
        data: Box<[u8]>,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 || depth_or_slices == 0 {
            return Err(Error::invalid_parameters(format!(
                "image extent {width}x{height}x{depth_or_slices} has a zero dimension"
            )));
        }
        let depth = if texture_type.has_slices() { 1 } else { depth_or_slices };
        if num_mipmaps == 0 || num_mipmaps > max_mipmaps(width, height, depth) {
            return Err(Error::invalid_parameters(format!(
                "{num_mipmaps} mipmaps is not valid for a {width}x{height}x{depth_or_slices} image"
            )));
        }
        let image = Image2 {
            width,
            height,
            depth_or_slices,
            num_mipmaps,
            texture_type,
            pixel_format,
            data,
        };
        let expected = image.size_bytes();
        if image.data.len() != expected {
            return Err(Error::invalid_parameters(format!(
                "image data is {} bytes, {} {}x{}x{} with {} mips needs {}",
                image.data.len(),
                pixel_format.name(),
                width,
                height,
                depth_or_slices,
                num_mipmaps,
                expected
            )));
        }
        Ok(image)
    }

    /// A single-mip 2D image filled with `value` bytes.
    pub fn solid(width: u32, height: u32, pixel_format: PixelFormatGpu, value: u8) -> Result<Self, Error> {
        let size = pixel_format.size_bytes(width, height, 1, 1, SYS_RAM_ROW_ALIGNMENT);
        Image2::new(
            width,
            height,
            1,
            1,
            TextureType::Type2D,
            pixel_format,
            vec![value; size].into_boxed_slice(),
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth_or_slices(&self) -> u32 {
        self.depth_or_slices
    }

    pub fn num_mipmaps(&self) -> u8 {
        self.num_mipmaps
    }

    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    pub fn pixel_format(&self) -> PixelFormatGpu {
        self.pixel_format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Box<[u8]> {
        self.data
    }

    fn depth_at(&self, mip: u8) -> u32 {
        if self.texture_type.has_slices() {
            self.depth_or_slices
        } else {
            mip_extent(self.depth_or_slices, mip)
        }
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

    fn size_bytes(&self) -> usize {
        (0..self.num_mipmaps).map(|mip| self.mip_size_bytes(mip)).sum()
    }

    /// Bytes per row of texels at `mip`.
    pub fn bytes_per_row(&self, mip: u8) -> usize {
        self.pixel_format
            .bytes_per_row(mip_extent(self.width, mip), SYS_RAM_ROW_ALIGNMENT)
    }

    /// Bytes of one slice (or depth layer) at `mip`.
    pub fn bytes_per_image(&self, mip: u8) -> usize {
        self.pixel_format.size_bytes(
            mip_extent(self.width, mip),
            mip_extent(self.height, mip),
            1,
            1,
            SYS_RAM_ROW_ALIGNMENT,
        )
    }

    /// The texels of mip level `mip`, all slices included.
    pub fn mip_data(&self, mip: u8) -> Result<&[u8], Error> {
        if mip >= self.num_mipmaps {
            return Err(Error::invalid_parameters(format!(
                "mip {mip} out of range, image has {}",
                self.num_mipmaps
            )));
        }
        let offset: usize = (0..mip).map(|m| self.mip_size_bytes(m)).sum();
        Ok(&self.data[offset..offset + self.mip_size_bytes(mip)])
    }

    /// Whether a texture described by this image's metadata would differ from `other`.
    pub fn same_metadata(&self, other: &Image2) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.depth_or_slices == other.depth_or_slices
            && self.num_mipmaps == other.num_mipmaps
            && self.texture_type == other.texture_type
            && self.pixel_format == other.pixel_format
    }
}

/// Decodes (and optionally encodes) one family of image files.
pub trait ImageCodec: Send + Sync + Debug {
    /// Lowercase file extensions handled by the codec, without the dot.
    fn extensions(&self) -> &[&'static str];

    fn decode(&self, bytes: &[u8]) -> Result<Image2, Error>;

    fn encode(&self, _image: &Image2) -> Result<Vec<u8>, Error> {
        Err(Error::NotImplemented(format!(
            "encoding {:?} images",
            self.extensions()
        )))
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    initialized: bool,
    by_extension: HashMap<String, Arc<dyn ImageCodec>>,
}

/// The set of codecs available to a manager.
///
/// A registry starts out uninitialized. [`CodecRegistry::init`] registers the
/// built-in codecs and [`CodecRegistry::shutdown`] releases every codec; lookups
/// outside that window fail with [`Error::InvalidState`].
///
/// # Examples
///
/// ```
/// use textures_and_passes::textures::CodecRegistry;
///
/// let registry = CodecRegistry::new();
/// registry.init();
/// assert!(registry.codec_for("wall.PNG").is_ok());
/// assert!(registry.codec_for("wall.dds").is_err());
/// registry.shutdown();
/// assert!(registry.codec_for("wall.png").is_err());
/// ```
#[derive(Debug, Default)]
pub struct CodecRegistry {
    state: Mutex<RegistryState>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the built-in codecs. Calling it again is harmless.
    pub fn init(&self) {
        let mut state = self.state.lock().expect("Failed to lock codec registry");
        if state.initialized {
            return;
        }
        state.initialized = true;
        let png: Arc<dyn ImageCodec> = Arc::new(PngCodec);
        for ext in png.extensions() {
            state.by_extension.insert(ext.to_string(), png.clone());
        }
        logwise::info_sync!("Codec registry initialized");
    }

    /// Releases every registered codec.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().expect("Failed to lock codec registry");
        state.by_extension.clear();
        state.initialized = false;
        logwise::info_sync!("Codec registry shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.state
            .lock()
            .expect("Failed to lock codec registry")
            .initialized
    }

    /// Adds a codec, replacing any codec registered for the same extensions.
    pub fn register(&self, codec: Arc<dyn ImageCodec>) -> Result<(), Error> {
        let mut state = self.state.lock().expect("Failed to lock codec registry");
        if !state.initialized {
            return Err(Error::invalid_state("codec registry is not initialized"));
        }
        for ext in codec.extensions() {
            state.by_extension.insert(ext.to_string(), codec.clone());
        }
        Ok(())
    }

    /// Looks up the codec for a file name by its extension.
    pub fn codec_for(&self, name: &str) -> Result<Arc<dyn ImageCodec>, Error> {
        let state = self.state.lock().expect("Failed to lock codec registry");
        if !state.initialized {
            return Err(Error::invalid_state("codec registry is not initialized"));
        }
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        state
            .by_extension
            .get(&ext)
            .cloned()
            .ok_or_else(|| Error::ItemNotFound(format!("no codec for '{name}'")))
    }

    pub fn decode(&self, name: &str, bytes: &[u8]) -> Result<Image2, Error> {
        self.codec_for(name)?.decode(bytes)
    }
}

/// Where the bytes of a named texture come from.
pub trait ImageSource: Send + Sync + Debug {
    fn open(&self, name: &str) -> Result<Vec<u8>, Error>;
}

/// Reads texture files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSystemSource { root: root.into() }
    }
}

impl ImageSource for FileSystemSource {
    fn open(&self, name: &str) -> Result<Vec<u8>, Error> {
        Ok(std::fs::read(self.root.join(name))?)
    }
}

/// Serves texture files from memory.
#[derive(Debug, Default)]
pub struct InMemorySource {
    files: Mutex<HashMap<String, Arc<[u8]>>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.files
            .lock()
            .expect("Failed to lock in-memory source")
            .insert(name.into(), bytes.into());
    }

    pub fn remove(&self, name: &str) {
        self.files
            .lock()
            .expect("Failed to lock in-memory source")
            .remove(name);
    }
}

impl ImageSource for InMemorySource {
    fn open(&self, name: &str) -> Result<Vec<u8>, Error> {
        self.files
            .lock()
            .expect("Failed to lock in-memory source")
            .get(name)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| Error::ItemNotFound(format!("no in-memory image named '{name}'")))
    }
}

/// An image source paired with the codecs that decode it.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    source: Arc<dyn ImageSource>,
    codecs: Arc<CodecRegistry>,
}

impl ImageLoader {
    pub fn new(source: Arc<dyn ImageSource>, codecs: Arc<CodecRegistry>) -> Self {
        ImageLoader { source, codecs }
    }

    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        &self.codecs
    }

    pub fn load(&self, name: &str) -> Result<Image2, Error> {
        let bytes = self.source.open(name)?;
        self.codecs.decode(name, &bytes)
    }
}
