//! Render-device abstraction for materializing decoded assets.
//!
//! The loader never talks to a graphics API directly; it hands decoded
//! CPU data to a [`RenderDevice`] and stores the opaque ids it gets back.
//! Device calls are made exclusively from the consumer thread (inside the
//! per-tick completion drain), so implementations do not need to support
//! concurrent resource creation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bitmap::BitmapImage;
use crate::model::MeshData;

/// Opaque handle to a device texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Opaque handle to a device mesh (vertex/index buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u64);

/// Failure reported by a render device.
#[derive(Debug)]
pub struct DeviceError {
    pub message: String,
}

impl DeviceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device error: {}", self.message)
    }
}

impl std::error::Error for DeviceError {}

/// A device capable of creating renderable resources from decoded data.
///
/// Implement this for your rendering backend. The returned ids stay valid
/// until the device itself is torn down; the asset pipeline never
/// destroys individual resources.
pub trait RenderDevice: Send + Sync {
    /// Create a texture from a decoded RGBA8 image.
    fn create_texture(&self, image: &BitmapImage) -> Result<TextureId, DeviceError>;

    /// Create vertex/index buffers for a mesh.
    fn create_mesh(&self, mesh: &MeshData) -> Result<MeshId, DeviceError>;
}

/// A device that allocates ids without touching a GPU.
///
/// Used by headless tools and tests; also handy as a reference for what a
/// real backend has to provide.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_id: AtomicU64,
    textures: AtomicU64,
    meshes: AtomicU64,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of textures created so far.
    pub fn textures_created(&self) -> u64 {
        self.textures.load(Ordering::SeqCst)
    }

    /// Total number of meshes created so far.
    pub fn meshes_created(&self) -> u64 {
        self.meshes.load(Ordering::SeqCst)
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_texture(&self, image: &BitmapImage) -> Result<TextureId, DeviceError> {
        let expected = (image.width * image.height * 4) as usize;
        if image.pixels.len() != expected {
            return Err(DeviceError::new(format!(
                "pixel buffer size {} does not match {}x{} RGBA8",
                image.pixels.len(),
                image.width,
                image.height
            )));
        }

        self.textures.fetch_add(1, Ordering::SeqCst);
        Ok(TextureId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn create_mesh(&self, mesh: &MeshData) -> Result<MeshId, DeviceError> {
        if mesh.positions.is_empty() {
            return Err(DeviceError::new("mesh has no vertices"));
        }

        self.meshes.fetch_add(1, Ordering::SeqCst);
        Ok(MeshId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_device_ids_are_unique() {
        let device = HeadlessDevice::new();
        let a = device.create_texture(&BitmapImage::white_pixel()).unwrap();
        let b = device.create_texture(&BitmapImage::white_pixel()).unwrap();
        assert_ne!(a, b);
        assert_eq!(device.textures_created(), 2);
    }

    #[test]
    fn test_headless_device_rejects_bad_pixel_buffer() {
        let device = HeadlessDevice::new();
        let broken = BitmapImage {
            width: 2,
            height: 2,
            pixels: vec![0; 3],
        };
        assert!(device.create_texture(&broken).is_err());
        assert_eq!(device.textures_created(), 0);
    }
}
