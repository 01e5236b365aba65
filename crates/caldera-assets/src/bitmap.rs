//! Decoded CPU-side image data.

use crate::error::{AssetError, AssetResult};

/// A raw, decoded RGBA8 image ready to hand to the render device.
#[derive(Debug, Clone)]
pub struct BitmapImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl BitmapImage {
    /// Decode an image from raw file bytes, sniffing the container format.
    ///
    /// `path` is only used for error reporting.
    pub fn decode(path: &str, bytes: &[u8]) -> AssetResult<Self> {
        let decoded = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        let rgba = decoded.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }

    /// The 1x1 opaque white image used as the texture placeholder.
    pub fn white_pixel() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![0xFF, 0xFF, 0xFF, 0xFF],
        }
    }
}
