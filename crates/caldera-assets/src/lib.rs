//! Asset management for the Caldera engine.
//!
//! Built around one invariant: a handle returned by a load request is
//! always valid and renderable. It is placeholder-backed at first and
//! hot-swapped in place once the background load finishes. See
//! [`AsyncAssetLoader`] for the full contract.

pub mod bitmap;
pub mod cache;
pub mod completion;
pub mod device;
pub mod error;
pub mod loader;
pub mod model;
pub mod texture;

pub use bitmap::BitmapImage;
pub use cache::AssetCache;
pub use completion::CompletionQueue;
pub use device::{DeviceError, HeadlessDevice, MeshId, RenderDevice, TextureId};
pub use error::{AssetError, AssetResult};
pub use loader::AsyncAssetLoader;
pub use model::{MeshData, Model, ModelInstance, ModelNode, ModelPayload, NodeLocal};
pub use texture::{Texture, TexturePayload};
