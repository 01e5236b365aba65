//! The texture asset type.

use std::sync::RwLock;

use crate::device::TextureId;

/// The renderable content behind a [`Texture`] handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexturePayload {
    pub resource: TextureId,
    pub width: u32,
    pub height: u32,
}

/// A shared texture asset.
///
/// Callers hold `Arc<Texture>`; the `Arc` is the asset's identity and
/// never changes across an async load. Only the payload behind it is
/// swapped in place once the real content is ready, so every holder
/// observes the new content on its next access.
#[derive(Debug)]
pub struct Texture {
    payload: RwLock<TexturePayload>,
}

impl Texture {
    pub(crate) fn new(payload: TexturePayload) -> Self {
        Self {
            payload: RwLock::new(payload),
        }
    }

    /// The device resource currently backing this texture. Always valid;
    /// the placeholder resource until the async load completes.
    pub fn resource(&self) -> TextureId {
        self.payload.read().unwrap().resource
    }

    /// Pixel dimensions of the current payload.
    pub fn size(&self) -> (u32, u32) {
        let payload = self.payload.read().unwrap();
        (payload.width, payload.height)
    }

    /// Current payload snapshot.
    pub fn payload(&self) -> TexturePayload {
        *self.payload.read().unwrap()
    }

    /// Hot-swap: replace the payload in place, preserving identity.
    pub(crate) fn swap_payload(&self, new_payload: TexturePayload) {
        *self.payload.write().unwrap() = new_payload;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_preserves_identity() {
        let texture = std::sync::Arc::new(Texture::new(TexturePayload {
            resource: TextureId(0),
            width: 1,
            height: 1,
        }));

        let held = std::sync::Arc::clone(&texture);
        texture.swap_payload(TexturePayload {
            resource: TextureId(9),
            width: 64,
            height: 32,
        });

        // The clone made before the swap sees the new content.
        assert_eq!(held.resource(), TextureId(9));
        assert_eq!(held.size(), (64, 32));
    }
}
