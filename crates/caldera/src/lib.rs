//! Caldera - background jobs and async asset streaming.
//!
//! Caldera pairs a fixed worker pool with a caching asset loader:
//!
//! - **Job scheduling**: submit closures at three priority levels; the
//!   pool dequeues strictly by priority with submission order as the
//!   tiebreak.
//! - **Async assets**: load requests return identity-stable,
//!   placeholder-backed handles immediately; decoded content is swapped
//!   in on the main thread once the background work finishes.
//! - **Explicit lifecycle**: everything hangs off an [`Engine`] context
//!   constructed at startup; no global singletons.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use caldera::prelude::*;
//!
//! let engine = Engine::builder()
//!     .build(Arc::new(HeadlessDevice::new()))
//!     .unwrap();
//!
//! let brick = engine
//!     .assets()
//!     .load_texture("assets/brick.png", Priority::Normal)
//!     .expect("non-empty path");
//!
//! loop {
//!     engine.update(); // applies finished loads
//!     let _current = brick.resource(); // placeholder until then
//! }
//! ```

pub mod engine;

// Re-export sub-crates
pub use caldera_assets as assets;
pub use caldera_core as core;
pub use caldera_jobs as jobs;

pub use engine::{Engine, EngineBuilder, EngineError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::{Engine, EngineBuilder, EngineError};

    pub use caldera_assets::{
        AsyncAssetLoader, HeadlessDevice, Model, ModelInstance, RenderDevice, Texture,
    };
    pub use caldera_core::config::{Config, ProfilingMode};
    pub use caldera_jobs::{JobError, JobHandle, JobScheduler, Priority};
}
