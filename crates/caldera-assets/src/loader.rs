//! The async asset loader.

use std::sync::{Arc, Mutex};

use caldera_core::profiling::profile_scope;
use caldera_jobs::{JobScheduler, Priority};

use crate::bitmap::BitmapImage;
use crate::cache::AssetCache;
use crate::completion::CompletionQueue;
use crate::device::RenderDevice;
use crate::error::{AssetError, AssetResult};
use crate::model::{self, Model, ModelPayload};
use crate::texture::{Texture, TexturePayload};

/// Orchestrates background asset loading.
///
/// A load request returns an immediately usable, placeholder-backed
/// handle and schedules one background job for the path. The job does the
/// CPU work (file read, decode/parse) on a worker thread and hands the
/// result to the consumer thread through a completion closure; device
/// resources are created there, inside [`update`](Self::update), and the
/// handle's payload is swapped in place. Callers never branch on a
/// "loading" state and never block on I/O.
///
/// # Example
///
/// ```ignore
/// let loader = AsyncAssetLoader::new(scheduler, device)?;
///
/// let brick = loader
///     .load_texture("assets/brick.png", Priority::Normal)
///     .expect("path was not empty");
///
/// // `brick` renders as the 1x1 white placeholder right away.
/// loop {
///     loader.update(); // per-tick pump on the consumer thread
///     draw(brick.resource());
/// }
/// ```
pub struct AsyncAssetLoader {
    scheduler: Arc<JobScheduler>,
    device: Arc<dyn RenderDevice>,
    textures: Mutex<AssetCache<Texture>>,
    models: Mutex<AssetCache<Model>>,
    completions: Arc<CompletionQueue>,
    placeholder: TexturePayload,
}

impl AsyncAssetLoader {
    /// Create a loader on top of a scheduler and a render device.
    ///
    /// The shared 1x1 white placeholder texture is created here, so a
    /// device failure surfaces at startup instead of on the first load.
    pub fn new(
        scheduler: Arc<JobScheduler>,
        device: Arc<dyn RenderDevice>,
    ) -> AssetResult<Self> {
        let white = BitmapImage::white_pixel();
        let resource =
            device
                .create_texture(&white)
                .map_err(|e| AssetError::ResourceCreation {
                    path: "<placeholder>".to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            scheduler,
            device,
            textures: Mutex::new(AssetCache::new()),
            models: Mutex::new(AssetCache::new()),
            completions: Arc::new(CompletionQueue::new()),
            placeholder: TexturePayload {
                resource,
                width: white.width,
                height: white.height,
            },
        })
    }

    /// The device resource backing not-yet-loaded textures.
    pub fn placeholder_texture(&self) -> TexturePayload {
        self.placeholder
    }

    /// Request a texture.
    ///
    /// Returns `None` only for an empty path. Otherwise the handle is
    /// valid and renderable from the instant it is returned, and at most
    /// one background job is in flight per path: a second request while
    /// the first handle is alive returns the same `Arc` without
    /// scheduling anything.
    pub fn load_texture(&self, path: &str, priority: Priority) -> Option<Arc<Texture>> {
        if path.is_empty() {
            return None;
        }

        let texture = {
            let mut cache = self.textures.lock().unwrap();
            if let Some(existing) = cache.get(path) {
                return Some(existing);
            }

            let texture = Arc::new(Texture::new(self.placeholder));
            cache.insert(path, &texture);
            texture
        };

        let weak = Arc::downgrade(&texture);
        let completions = Arc::clone(&self.completions);
        let device = Arc::clone(&self.device);
        let path = path.to_string();
        self.scheduler.submit_with_priority(priority, move || {
            profile_scope!("load_texture", &path);
            tracing::info!("loading texture: {}", path);

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!("failed to read texture '{}': {}", path, e);
                    return;
                }
            };

            let image = match BitmapImage::decode(&path, &bytes) {
                Ok(image) => image,
                Err(e) => {
                    tracing::error!("{}", e);
                    return;
                }
            };

            // Device-object creation happens on the consumer thread; the
            // worker only hands over the decoded pixels.
            completions.push(move || {
                let texture = match weak.upgrade() {
                    Some(texture) => texture,
                    None => return,
                };

                match device.create_texture(&image) {
                    Ok(resource) => {
                        texture.swap_payload(TexturePayload {
                            resource,
                            width: image.width,
                            height: image.height,
                        });
                        tracing::debug!("texture ready: {}", path);
                    }
                    Err(e) => {
                        tracing::error!(
                            "failed to create texture resource for '{}': {}",
                            path,
                            e
                        );
                    }
                }
            });
        });

        Some(texture)
    }

    /// Request a model. Same contract as [`load_texture`](Self::load_texture);
    /// the placeholder is an empty-but-valid payload that draws nothing.
    pub fn load_model(&self, path: &str, priority: Priority) -> Option<Arc<Model>> {
        if path.is_empty() {
            return None;
        }

        let model = {
            let mut cache = self.models.lock().unwrap();
            if let Some(existing) = cache.get(path) {
                return Some(existing);
            }

            let model = Arc::new(Model::new(ModelPayload::empty()));
            cache.insert(path, &model);
            model
        };

        let weak = Arc::downgrade(&model);
        let completions = Arc::clone(&self.completions);
        let device = Arc::clone(&self.device);
        let path = path.to_string();
        self.scheduler.submit_with_priority(priority, move || {
            profile_scope!("load_model", &path);
            tracing::info!("loading model: {}", path);

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!("failed to read model '{}': {}", path, e);
                    return;
                }
            };

            let payload = match model::parse_obj(&path, &bytes) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!("{}", e);
                    return;
                }
            };

            completions.push(move || {
                let model = match weak.upgrade() {
                    Some(model) => model,
                    None => return,
                };

                let mut gpu_meshes = Vec::with_capacity(payload.meshes.len());
                for mesh in &payload.meshes {
                    match device.create_mesh(mesh) {
                        Ok(id) => gpu_meshes.push(id),
                        Err(e) => {
                            tracing::error!(
                                "failed to create mesh buffers for '{}': {}",
                                path,
                                e
                            );
                            return;
                        }
                    }
                }

                let mut payload = payload;
                payload.gpu_meshes = gpu_meshes;
                model.swap_payload(payload);
                tracing::debug!("model ready: {}", path);
            });
        });

        Some(model)
    }

    /// Per-tick pump; consumer thread only.
    ///
    /// Drains the completion queue with a swap-and-clear and executes the
    /// closures in insertion order, outside the lock. Each closure
    /// resolves its weak handle; handles dropped since the job ran make
    /// the closure a no-op.
    pub fn update(&self) {
        let completions = self.completions.take();
        if completions.is_empty() {
            return;
        }

        profile_scope!("asset_completions");
        for completion in completions {
            completion();
        }
    }

    /// Shut the loader down: stop callback delivery and wipe the caches.
    ///
    /// Jobs already running are not cancelled; they run to completion and
    /// their completion closures are silently dropped. Handles still held
    /// by callers stay valid with whatever payload they last had.
    pub fn release(&self) {
        self.completions.close();
        self.textures.lock().unwrap().clear();
        self.models.lock().unwrap().clear();
        tracing::debug!("asset loader released");
    }

    /// Completions waiting for the next [`update`](Self::update) call.
    pub fn pending_completions(&self) -> usize {
        self.completions.pending()
    }

    /// The scheduler this loader submits jobs to.
    pub fn scheduler(&self) -> &Arc<JobScheduler> {
        &self.scheduler
    }
}
