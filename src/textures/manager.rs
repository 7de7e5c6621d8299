// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Owns every texture and executes their scheduled transitions.

Scheduling a transition on a [`TextureGpu`] pushes a [`ScheduledTransition`]
onto the manager's queue. The queue is drained in batches, either explicitly
with [`TextureGpuManager::process_queue`] or by a worker thread started with
[`TextureGpuManager::start_worker`]. Within a batch, images that must come from
the texture's source are decoded up front (in parallel when
[`ResidencyConfig::multiload`] is set), then every transition executes in the
order it was scheduled.

A failure while executing a transition never escapes the worker. It is
logged, the texture is marked as failed, and listeners receive
[`TextureChangeReason::ExceptionThrown`].
*/

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crate::config::{OrientationMode, ResidencyConfig};
use crate::error::Error;
use crate::imp::GpuTextureBackend;
use crate::pixel_formats::PixelFormatGpu;

use super::pool::{TexturePool, TexturePoolInfo};
use super::{
    GpuPageOutStrategy, GpuResidency, Image2, ImageLoader, PoolId, TextureChangeReason, TextureFlags, TextureGpu,
    TextureGpuBuilder, TextureId, TextureType,
};

/// Metadata remembered from a previous load of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedMetadata {
    pub width: u32,
    pub height: u32,
    pub depth_or_slices: u32,
    pub num_mipmaps: u8,
    pub texture_type: TextureType,
    pub pixel_format: PixelFormatGpu,
}

impl CachedMetadata {
    pub fn from_image(image: &Image2) -> Self {
        CachedMetadata {
            width: image.width(),
            height: image.height(),
            depth_or_slices: image.depth_or_slices(),
            num_mipmaps: image.num_mipmaps(),
            texture_type: image.texture_type(),
            pixel_format: image.pixel_format(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionKind {
    Residency(GpuResidency),
    /// Upload fresh contents into a texture that is (or will be) resident.
    Reload,
}

/// One unit of queued work.
pub(crate) struct ScheduledTransition {
    pub texture: Arc<TextureGpu>,
    pub kind: TransitionKind,
    pub image: Option<Arc<Image2>>,
    pub auto_delete_image: bool,
    pub skip_multiload: bool,
}

impl ScheduledTransition {
    /// Whether executing this request will read the texture's source.
    fn needs_source(&self) -> bool {
        if self.image.is_some() || self.texture.is_manual_texture() || self.texture.has_load_failed() {
            return false;
        }
        match self.kind {
            TransitionKind::Reload => true,
            TransitionKind::Residency(GpuResidency::OnStorage) => false,
            TransitionKind::Residency(_) => self.texture.residency() == GpuResidency::OnStorage,
        }
    }
}

#[derive(Default)]
struct Registry {
    by_id: BTreeMap<TextureId, Arc<TextureGpu>>,
    by_name: HashMap<String, TextureId>,
}

pub(crate) struct ManagerShared {
    backend: Arc<dyn GpuTextureBackend>,
    config: ResidencyConfig,
    loader: Option<ImageLoader>,
    registry: Mutex<Registry>,
    queue: Mutex<VecDeque<ScheduledTransition>>,
    queue_signal: Condvar,
    processing: Mutex<()>,
    pools: Mutex<Vec<TexturePool>>,
    next_pool_id: AtomicU32,
    metadata_cache: Mutex<HashMap<String, CachedMetadata>>,
}

impl ManagerShared {
    pub fn backend(&self) -> &Arc<dyn GpuTextureBackend> {
        &self.backend
    }

    pub fn enqueue(&self, transition: ScheduledTransition) {
        let mut queue = self.queue.lock().expect("Failed to lock queue");
        queue.push_back(transition);
        self.queue_signal.notify_all();
    }

    pub fn cached_metadata(&self, name: &str) -> Option<CachedMetadata> {
        if !self.config.use_metadata_cache {
            return None;
        }
        self.metadata_cache
            .lock()
            .expect("Failed to lock metadata_cache")
            .get(name)
            .copied()
    }

    fn remember_metadata(&self, texture: &TextureGpu, image: &Image2) {
        if !self.config.use_metadata_cache || texture.is_manual_texture() {
            return;
        }
        self.metadata_cache
            .lock()
            .expect("Failed to lock metadata_cache")
            .insert(texture.name().to_string(), CachedMetadata::from_image(image));
    }

    /// Finds (or creates) a pool with room for `texture` and claims a slice of it.
    pub fn reserve_pool_slot(self: &Arc<Self>, texture: &TextureGpu) -> Result<(PoolId, u16), Error> {
        let metadata = texture.metadata();
        let mut pools = self.pools.lock().expect("Failed to lock pools");
        let existing = pools.iter_mut().find(|pool| {
            pool.accepts(
                metadata.width,
                metadata.height,
                metadata.pixel_format,
                metadata.num_mipmaps,
            )
        });
        if let Some(pool) = existing {
            if let Some(slice) = pool.reserve(texture.id()) {
                return Ok((pool.id(), slice));
            }
        }

        let id = PoolId(self.next_pool_id.fetch_add(1, Ordering::Relaxed));
        let master = Arc::new(TextureGpu::new(
            format!("texture pool {}", id.get()),
            TextureFlags::POOL_OWNER | TextureFlags::MANUAL_TEXTURE,
            TextureType::Type2DArray,
            GpuPageOutStrategy::Discard,
            Arc::downgrade(self),
        ));
        master.set_resolution(metadata.width, metadata.height, self.config.pool_slices as u32)?;
        master.set_pixel_format(metadata.pixel_format)?;
        master.set_num_mipmaps(metadata.num_mipmaps)?;
        master.transition_to(GpuResidency::Resident, None, true)?;
        logwise::info_sync!(
            "Created texture pool {id} for {format}",
            id = id.get(),
            format = logwise::privacy::LogIt(metadata.pixel_format.name())
        );
        let mut pool = TexturePool::new(
            id,
            master,
            metadata.width,
            metadata.height,
            metadata.pixel_format,
            metadata.num_mipmaps,
            self.config.pool_slices,
        );
        let slice = pool
            .reserve(texture.id())
            .ok_or_else(|| Error::invalid_parameters("texture pools need at least one slice"))?;
        pools.push(pool);
        Ok((id, slice))
    }

    pub fn release_pool_slot(&self, pool: PoolId, slice: u16) {
        let emptied = {
            let mut pools = self.pools.lock().expect("Failed to lock pools");
            let Some(index) = pools.iter().position(|p| p.id() == pool) else {
                return;
            };
            if pools[index].release(slice) {
                Some(pools.remove(index))
            } else {
                None
            }
        };
        if let Some(pool) = emptied {
            logwise::info_sync!("Releasing empty texture pool {id}", id = pool.id().get());
            if let Err(err) = pool.master().transition_to(GpuResidency::OnStorage, None, true) {
                logwise::error_sync!(
                    "Failed to release texture pool: {err}",
                    err = logwise::privacy::LogIt(&err)
                );
            }
        }
    }

    pub fn pool_master(&self, pool: PoolId) -> Result<Arc<TextureGpu>, Error> {
        self.pools
            .lock()
            .expect("Failed to lock pools")
            .iter()
            .find(|p| p.id() == pool)
            .map(|p| p.master().clone())
            .ok_or_else(|| Error::ItemNotFound(format!("texture pool {}", pool.get())))
    }

    /// Drains the queue once and executes everything in it. Returns the number
    /// of transitions executed.
    fn process_batch(&self) -> usize {
        let _processing = self.processing.lock().expect("Failed to lock processing");
        let mut batch: Vec<ScheduledTransition> = self.queue.lock().expect("Failed to lock queue").drain(..).collect();
        if batch.is_empty() {
            return 0;
        }
        logwise::trace_sync!("Processing {count} texture transitions", count = batch.len());
        let mut decoded = self.predecode(&batch);
        let count = batch.len();
        for (index, mut transition) in batch.drain(..).enumerate() {
            if let Some(result) = decoded.remove(&index) {
                match result {
                    Ok(image) => transition.image = Some(Arc::new(image)),
                    Err(err) => {
                        self.report_failure(&transition.texture, &err);
                        continue;
                    }
                }
            }
            self.execute(transition);
        }
        count
    }

    /// Decodes the source images a batch will need. Keys are batch indices.
    fn predecode(&self, batch: &[ScheduledTransition]) -> HashMap<usize, Result<Image2, Error>> {
        let Some(loader) = &self.loader else {
            return HashMap::new();
        };
        let wanted: Vec<(usize, &str)> = batch
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.skip_multiload && t.needs_source())
            .map(|(index, t)| (index, t.texture.name()))
            .collect();
        if wanted.is_empty() {
            return HashMap::new();
        }
        if !self.config.multiload || cfg!(target_arch = "wasm32") || wanted.len() == 1 {
            return wanted
                .into_iter()
                .map(|(index, name)| (index, loader.load(name)))
                .collect();
        }

        let interval = logwise::perfwarn_begin!("multiload decode");
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(wanted.len());
        let chunk_size = wanted.len().div_ceil(threads);
        let decoded = std::thread::scope(|scope| {
            let handles: Vec<_> = wanted
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|(index, name)| (*index, loader.load(name)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(_) => Vec::new(),
                })
                .collect::<HashMap<_, _>>()
        });
        drop(interval);
        decoded
    }

    fn execute(&self, mut transition: ScheduledTransition) {
        let texture = transition.texture.clone();
        if texture.has_load_failed() {
            texture.abandon_transition();
            return;
        }
        let result = match transition.kind {
            TransitionKind::Residency(target) => self.execute_residency(&mut transition, target),
            TransitionKind::Reload => self.execute_reload(&mut transition),
        };
        if let Err(err) = result {
            self.report_failure(&texture, &err);
        }
    }

    fn report_failure(&self, texture: &TextureGpu, err: &Error) {
        logwise::error_sync!(
            "Texture transition failed for {name}: {err}",
            name = logwise::privacy::LogIt(texture.name()),
            err = logwise::privacy::LogIt(err)
        );
        texture.notify_load_failed(err);
    }

    fn source_image(&self, transition: &mut ScheduledTransition) -> Result<Arc<Image2>, Error> {
        if let Some(image) = transition.image.take() {
            return Ok(image);
        }
        let loader = self.loader.as_ref().ok_or_else(|| {
            Error::ItemNotFound(format!(
                "{} has no image and the manager has no loader",
                transition.texture.name()
            ))
        })?;
        Ok(Arc::new(loader.load(transition.texture.name())?))
    }

    fn execute_residency(&self, transition: &mut ScheduledTransition, target: GpuResidency) -> Result<(), Error> {
        let texture = transition.texture.clone();
        let current = texture.residency();
        let keep_copy = texture.page_out_strategy() == GpuPageOutStrategy::AlwaysKeepSystemRamCopy;
        if current == target {
            return texture.complete_transition();
        }
        match (current, target) {
            (GpuResidency::OnStorage, GpuResidency::Resident) => {
                if texture.is_manual_texture() && transition.image.is_none() {
                    texture.transition_to(GpuResidency::Resident, None, true)?;
                    return texture.notify_data_is_ready();
                }
                let image = self.source_image(transition)?;
                texture.apply_image_metadata(&image)?;
                self.remember_metadata(&texture, &image);
                if keep_copy {
                    let bytes = image_bytes(image, transition.auto_delete_image);
                    texture.transition_to(GpuResidency::OnSystemRam, Some(bytes), true)?;
                    texture.transition_to(GpuResidency::Resident, None, true)?;
                } else {
                    texture.transition_to(GpuResidency::Resident, None, true)?;
                    texture.upload_image(&image)?;
                }
                texture.notify_data_is_ready()
            }
            (GpuResidency::OnStorage, GpuResidency::OnSystemRam) => {
                let image = self.source_image(transition)?;
                texture.apply_image_metadata(&image)?;
                self.remember_metadata(&texture, &image);
                let bytes = image_bytes(image, transition.auto_delete_image);
                texture.transition_to(GpuResidency::OnSystemRam, Some(bytes), true)?;
                texture.complete_transition()
            }
            (GpuResidency::OnSystemRam, GpuResidency::Resident) => {
                texture.transition_to(GpuResidency::Resident, None, true)?;
                texture.notify_data_is_ready()
            }
            (GpuResidency::Resident, GpuResidency::OnSystemRam) => {
                if keep_copy && texture.has_sys_ram_copy() {
                    texture.transition_to(GpuResidency::OnSystemRam, None, true)?;
                    texture.complete_transition()
                } else {
                    let copy = texture.download_all()?;
                    texture.notify_sys_ram_download_is_ready(copy, false)
                }
            }
            (_, GpuResidency::OnStorage) => {
                texture.transition_to(GpuResidency::OnStorage, None, true)?;
                texture.complete_transition()
            }
            (_, _) => unreachable!("equal residencies return early"),
        }
    }

    fn execute_reload(&self, transition: &mut ScheduledTransition) -> Result<(), Error> {
        let texture = transition.texture.clone();
        if texture.residency() != GpuResidency::Resident {
            return self.execute_residency(transition, GpuResidency::Resident);
        }
        let keep_copy = texture.page_out_strategy() == GpuPageOutStrategy::AlwaysKeepSystemRamCopy;
        let image = self.source_image(transition)?;
        if texture.image_matches_metadata(&image) {
            texture.upload_image(&image)?;
            self.remember_metadata(&texture, &image);
            if keep_copy {
                texture.replace_sys_ram_copy(image_bytes(image, transition.auto_delete_image));
            }
        } else {
            logwise::warn_sync!(
                "Cached metadata of {name} is out of date; reloading",
                name = logwise::privacy::LogIt(texture.name())
            );
            texture.transition_to(GpuResidency::OnStorage, None, true)?;
            texture.apply_image_metadata(&image)?;
            self.remember_metadata(&texture, &image);
            if keep_copy {
                let bytes = image_bytes(image, transition.auto_delete_image);
                texture.transition_to(GpuResidency::Resident, Some(bytes), true)?;
            } else {
                texture.transition_to(GpuResidency::Resident, None, true)?;
                texture.upload_image(&image)?;
            }
            texture.notify_all_listeners_texture_changed(TextureChangeReason::MetadataCacheOutOfDate, None);
        }
        texture.notify_data_is_ready()
    }
}

/// Takes over the image's buffer when allowed and possible, copies otherwise.
fn image_bytes(image: Arc<Image2>, auto_delete: bool) -> Box<[u8]> {
    if auto_delete {
        match Arc::try_unwrap(image) {
            Ok(image) => image.into_data(),
            Err(shared) => shared.data().into(),
        }
    } else {
        image.data().into()
    }
}

/// Creates textures and executes their residency transitions.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use textures_and_passes::config::ResidencyConfig;
/// use textures_and_passes::imp::nop::NopBackend;
/// use textures_and_passes::pixel_formats::PixelFormatGpu;
/// use textures_and_passes::textures::{GpuResidency, TextureFlags, TextureGpuManager, TextureType};
///
/// let manager = TextureGpuManager::new(Arc::new(NopBackend::new()), ResidencyConfig::default());
/// let target = manager
///     .texture("shadow map", TextureType::Type2D)
///     .with_flags(TextureFlags::RENDER_TO_TEXTURE)
///     .with_resolution(1024, 1024, 1)
///     .with_pixel_format(PixelFormatGpu::D32Float)
///     .build()
///     .unwrap();
/// target.schedule_transition_to(GpuResidency::Resident).unwrap();
/// assert_eq!(manager.process_queue(), 1);
/// assert_eq!(target.residency(), GpuResidency::Resident);
/// ```
pub struct TextureGpuManager {
    shared: Arc<ManagerShared>,
}

impl Debug for TextureGpuManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureGpuManager")
            .field("backend", &self.shared.backend.name())
            .field("config", &self.shared.config)
            .field("pending_requests", &self.pending_requests())
            .finish_non_exhaustive()
    }
}

impl TextureGpuManager {
    /// A manager without an image loader. Textures must be given their images
    /// explicitly (or be render targets).
    pub fn new(backend: Arc<dyn GpuTextureBackend>, config: ResidencyConfig) -> Self {
        Self::build(backend, config, None)
    }

    /// A manager that loads textures by name through `loader`.
    pub fn with_loader(backend: Arc<dyn GpuTextureBackend>, config: ResidencyConfig, loader: ImageLoader) -> Self {
        Self::build(backend, config, Some(loader))
    }

    fn build(backend: Arc<dyn GpuTextureBackend>, config: ResidencyConfig, loader: Option<ImageLoader>) -> Self {
        logwise::info_sync!(
            "Creating texture manager on {backend}",
            backend = logwise::privacy::LogIt(backend.name())
        );
        TextureGpuManager {
            shared: Arc::new(ManagerShared {
                backend,
                config,
                loader,
                registry: Mutex::new(Registry::default()),
                queue: Mutex::new(VecDeque::new()),
                queue_signal: Condvar::new(),
                processing: Mutex::new(()),
                pools: Mutex::new(Vec::new()),
                next_pool_id: AtomicU32::new(1),
                metadata_cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &ResidencyConfig {
        &self.shared.config
    }

    pub fn backend(&self) -> &Arc<dyn GpuTextureBackend> {
        &self.shared.backend
    }

    /// Starts building a texture.
    pub fn texture<'a>(&'a self, name: &'a str, texture_type: TextureType) -> TextureGpuBuilder<'a> {
        TextureGpuBuilder::new(self, name, texture_type)
    }

    /// Creates a texture with default settings. Shorthand for [`TextureGpuManager::texture`].
    pub fn create_texture(
        &self,
        name: &str,
        flags: TextureFlags,
        texture_type: TextureType,
    ) -> Result<Arc<TextureGpu>, Error> {
        self.texture(name, texture_type).with_flags(flags).build()
    }

    pub(crate) fn register(
        &self,
        name: &str,
        mut flags: TextureFlags,
        texture_type: TextureType,
        page_out_strategy: Option<GpuPageOutStrategy>,
    ) -> Result<Arc<TextureGpu>, Error> {
        if self.shared.config.render_target_orientation == OrientationMode::Flipped
            && flags.contains(TextureFlags::RENDER_TO_TEXTURE)
        {
            flags |= TextureFlags::REQUIRES_TEXTURE_FLIPPING;
        }
        let mut registry = self.shared.registry.lock().expect("Failed to lock registry");
        if registry.by_name.contains_key(name) {
            return Err(Error::invalid_parameters(format!("a texture named {name} already exists")));
        }
        let texture = Arc::new(TextureGpu::new(
            name.to_string(),
            flags,
            texture_type,
            page_out_strategy.unwrap_or(self.shared.config.default_page_out_strategy),
            Arc::downgrade(&self.shared),
        ));
        registry.by_name.insert(name.to_string(), texture.id());
        registry.by_id.insert(texture.id(), texture.clone());
        logwise::trace_sync!(
            "Created texture {name}",
            name = logwise::privacy::LogIt(name)
        );
        Ok(texture)
    }

    pub fn find_texture(&self, name: &str) -> Option<Arc<TextureGpu>> {
        let registry = self.shared.registry.lock().expect("Failed to lock registry");
        registry
            .by_name
            .get(name)
            .and_then(|id| registry.by_id.get(id))
            .cloned()
    }

    pub fn texture_by_id(&self, id: TextureId) -> Option<Arc<TextureGpu>> {
        self.shared
            .registry
            .lock()
            .expect("Failed to lock registry")
            .by_id
            .get(&id)
            .cloned()
    }

    /// Every live texture, in creation order.
    pub fn textures(&self) -> Vec<Arc<TextureGpu>> {
        self.shared
            .registry
            .lock()
            .expect("Failed to lock registry")
            .by_id
            .values()
            .cloned()
            .collect()
    }

    /// Destroys a texture, releasing its GPU storage and system RAM copy.
    ///
    /// Fails with [`Error::InvalidState`] while transitions are pending or a
    /// listener asks for the texture to stay loaded. Listeners receive
    /// [`TextureChangeReason::Deleted`] and are then detached.
    pub fn destroy_texture(&self, texture: &Arc<TextureGpu>) -> Result<(), Error> {
        if self.texture_by_id(texture.id()).is_none() {
            return Err(Error::ItemNotFound(format!("texture {}", texture.name())));
        }
        if texture.pending_transitions() != 0 {
            return Err(Error::invalid_state(format!(
                "{} has pending transitions",
                texture.name()
            )));
        }
        if texture.should_stay_loaded() {
            return Err(Error::invalid_state(format!(
                "a listener keeps {} loaded",
                texture.name()
            )));
        }
        if texture.residency() != GpuResidency::OnStorage {
            texture.transition_to(GpuResidency::OnStorage, None, true)?;
        }
        texture.notify_all_listeners_texture_changed(TextureChangeReason::Deleted, None);
        texture.clear_listeners();
        let mut registry = self.shared.registry.lock().expect("Failed to lock registry");
        registry.by_id.remove(&texture.id());
        registry.by_name.remove(texture.name());
        Ok(())
    }

    /// Executes queued transitions on the calling thread until the queue is
    /// empty. Returns how many were executed.
    pub fn process_queue(&self) -> usize {
        let mut total = 0;
        loop {
            let executed = self.shared.process_batch();
            if executed == 0 {
                return total;
            }
            total += executed;
        }
    }

    /// Transitions waiting in the queue, not counting a batch being executed.
    pub fn pending_requests(&self) -> usize {
        self.shared.queue.lock().expect("Failed to lock queue").len()
    }

    /// Executes queued work on the calling thread until `texture` is ready.
    ///
    /// With `metadata_only` this returns once geometry and format are final;
    /// otherwise it also waits for the data and flushes the GPU. Fails with
    /// [`Error::InvalidState`] when nothing queued can make the texture ready
    /// or its load fails.
    pub fn wait_for(&self, texture: &TextureGpu, metadata_only: bool) -> Result<(), Error> {
        let ready = || {
            texture.has_load_failed()
                || if metadata_only {
                    texture.is_metadata_ready()
                } else {
                    texture.pending_transitions() == 0
                }
        };
        while !ready() {
            if self.shared.process_batch() == 0 && !ready() {
                return Err(Error::invalid_state(format!(
                    "{} is not ready and nothing is scheduled for it",
                    texture.name()
                )));
            }
        }
        if metadata_only {
            if texture.has_load_failed() {
                return Err(Error::invalid_state(format!("{} failed to load", texture.name())));
            }
            Ok(())
        } else {
            texture.finish_waiting_for_data()
        }
    }

    /// Starts a thread that executes transitions as they are scheduled.
    ///
    /// The worker stops when the returned handle is stopped or dropped.
    pub fn start_worker(&self) -> Result<WorkerHandle, Error> {
        let stop = Arc::new(AtomicBool::new(false));
        let shared = self.shared.clone();
        let move_stop = stop.clone();
        let thread = std::thread::Builder::new()
            .name("texture residency worker".to_string())
            .spawn(move || worker_loop(shared, move_stop))?;
        logwise::info_sync!("Started texture residency worker");
        Ok(WorkerHandle {
            stop,
            shared: self.shared.clone(),
            thread: Some(thread),
        })
    }

    /// The remembered metadata of `name`, if the cache is enabled and has it.
    pub fn cached_metadata(&self, name: &str) -> Option<CachedMetadata> {
        self.shared.cached_metadata(name)
    }

    /// A snapshot of the metadata cache, suitable for persisting.
    pub fn metadata_cache(&self) -> HashMap<String, CachedMetadata> {
        self.shared.metadata_cache.lock().expect("Failed to lock metadata_cache").clone()
    }

    /// Seeds the metadata cache, for example with a snapshot from a previous run.
    pub fn import_metadata_cache(&self, entries: impl IntoIterator<Item = (String, CachedMetadata)>) {
        self.shared
            .metadata_cache
            .lock()
            .expect("Failed to lock metadata_cache")
            .extend(entries);
    }

    pub fn pools(&self) -> Vec<TexturePoolInfo> {
        self.shared
            .pools
            .lock()
            .expect("Failed to lock pools")
            .iter()
            .map(TexturePool::info)
            .collect()
    }
}

fn worker_loop(shared: Arc<ManagerShared>, stop: Arc<AtomicBool>) {
    loop {
        {
            let mut queue = shared.queue.lock().expect("Failed to lock queue");
            while queue.is_empty() && !stop.load(Ordering::Acquire) {
                queue = shared.queue_signal.wait(queue).expect("Failed to wait for queue");
            }
            if stop.load(Ordering::Acquire) {
                return;
            }
        }
        shared.process_batch();
    }
}

/// Controls a worker started with [`TextureGpuManager::start_worker`].
pub struct WorkerHandle {
    stop: Arc<AtomicBool>,
    shared: Arc<ManagerShared>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Debug for WorkerHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("stopped", &self.stop.load(Ordering::Relaxed))
            .finish()
    }
}

impl WorkerHandle {
    /// Stops the worker after its current batch and joins it. Work still in
    /// the queue stays there.
    pub fn stop(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        {
            let _queue = self.shared.queue.lock().expect("Failed to lock queue");
            self.stop.store(true, Ordering::Release);
            self.shared.queue_signal.notify_all();
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                logwise::error_sync!("Texture residency worker panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
