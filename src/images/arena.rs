//! Arena of decoded images owned by a load result.
//!
//! Records refer to images by [`ImageHandle`] instead of holding pixels, so
//! the bitmaps live exactly as long as the [`crate::AnnotationSet`].

use serde::Serialize;

use super::DecodedImage;

/// Index of an image in an [`ImageArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ImageHandle(pub u32);

impl ImageHandle {
    /// Shift a page-local handle by the size of the arena it is merged into.
    pub fn rebased(self, offset: u32) -> Self {
        ImageHandle(self.0 + offset)
    }
}

/// Append-only image storage.
#[derive(Debug, Clone, Default)]
pub struct ImageArena {
    images: Vec<DecodedImage>,
}

impl ImageArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an image and return its handle.
    pub fn push(&mut self, image: DecodedImage) -> ImageHandle {
        self.images.push(image);
        ImageHandle((self.images.len() - 1) as u32)
    }

    /// Look up an image.
    pub fn get(&self, handle: ImageHandle) -> Option<&DecodedImage> {
        self.images.get(handle.0 as usize)
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True if no image is stored.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Move every image of `other` into this arena. Handles issued by
    /// `other` must be shifted by the returned offset.
    pub fn absorb(&mut self, other: ImageArena) -> u32 {
        let offset = self.images.len() as u32;
        self.images.extend(other.images);
        offset
    }

    /// Iterate over `(handle, image)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (ImageHandle, &DecodedImage)> {
        self.images
            .iter()
            .enumerate()
            .map(|(i, image)| (ImageHandle(i as u32), image))
    }
}
