//! Engine context - owns the scheduler and the asset loader.

use std::fmt;
use std::sync::Arc;

use caldera_assets::{AssetError, AsyncAssetLoader, RenderDevice};
use caldera_core::config::{Config, ProfilingMode};
use caldera_core::profiling;
use caldera_jobs::JobScheduler;

/// Errors that can occur while constructing the engine.
#[derive(Debug)]
pub enum EngineError {
    /// The asset loader failed to initialize (e.g. the device refused to
    /// create the placeholder texture).
    AssetInit(AssetError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::AssetInit(e) => write!(f, "asset loader init failed: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::AssetInit(e) => Some(e),
        }
    }
}

/// The engine's service context.
///
/// Constructed once at startup and passed by reference to whatever needs
/// scheduling or asset loading. There are no global singletons, so init
/// and teardown order are explicit and each piece can be tested in
/// isolation.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use caldera::Engine;
/// use caldera_assets::HeadlessDevice;
///
/// let mut engine = Engine::builder()
///     .worker_threads(2)
///     .build(Arc::new(HeadlessDevice::new()))
///     .unwrap();
///
/// // per tick, on the main thread:
/// engine.update();
///
/// engine.shutdown();
/// ```
pub struct Engine {
    scheduler: Arc<JobScheduler>,
    assets: Arc<AsyncAssetLoader>,
    released: bool,
}

impl Engine {
    /// Create an engine builder.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Build an engine with the default configuration.
    pub fn new(device: Arc<dyn RenderDevice>) -> Result<Self, EngineError> {
        EngineBuilder::new().build(device)
    }

    /// The background job scheduler.
    pub fn scheduler(&self) -> &Arc<JobScheduler> {
        &self.scheduler
    }

    /// The async asset loader.
    pub fn assets(&self) -> &Arc<AsyncAssetLoader> {
        &self.assets
    }

    /// Per-tick pump; call once per frame on the main thread.
    ///
    /// Advances the profiler frame and applies finished asset loads.
    pub fn update(&self) {
        profiling::new_frame();
        self.assets.update();
    }

    /// Tear the engine down: the loader first (stops callback delivery),
    /// then the scheduler (joins every worker). Idempotent; also runs on
    /// drop.
    pub fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        self.assets.release();
        self.scheduler.shutdown();
        tracing::info!("engine shut down");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builder for constructing an [`Engine`].
pub struct EngineBuilder {
    config: Config,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Use an existing configuration wholesale.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Override the worker-thread count (default: detected hardware
    /// concurrency).
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = Some(count);
        self
    }

    /// Select the profiling mode (default: off).
    pub fn profiling(mut self, mode: ProfilingMode) -> Self {
        self.config.profiling = mode;
        self
    }

    /// Start the worker pool and the asset loader on top of `device`.
    pub fn build(self, device: Arc<dyn RenderDevice>) -> Result<Engine, EngineError> {
        profiling::init_profiling(self.config.profiling);

        let scheduler = Arc::new(match self.config.worker_threads {
            Some(count) => JobScheduler::with_threads(count),
            None => JobScheduler::new(),
        });
        scheduler.start();

        let assets = AsyncAssetLoader::new(Arc::clone(&scheduler), device)
            .map_err(EngineError::AssetInit)?;

        tracing::info!(
            "engine started with {} worker threads",
            scheduler.thread_count()
        );

        Ok(Engine {
            scheduler,
            assets: Arc::new(assets),
            released: false,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
