use smallvec::SmallVec;

use crate::sync::ImageAccess;

/// A unit of render work, described by the images it touches and how.
///
/// Built by the renderer for a draw or pass and handed to
/// [`RenderState::prepare_operation`] before the work's commands are recorded.
///
/// [`RenderState::prepare_operation`]: crate::state::RenderState::prepare_operation
#[derive(Debug, Clone)]
pub struct RenderOperation<K> {
    image_accesses: SmallVec<[(K, ImageAccess); 4]>,
}

impl<K> Default for RenderOperation<K> {
    fn default() -> Self {
        Self {
            image_accesses: SmallVec::new(),
        }
    }
}

impl<K> RenderOperation<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an image access and returns the operation.
    pub fn with_image_access(mut self, image: K, access: ImageAccess) -> Self {
        self.add_image_access(image, access);
        self
    }

    /// Adds an image access. Accesses are prepared in insertion order.
    pub fn add_image_access(&mut self, image: K, access: ImageAccess) {
        self.image_accesses.push((image, access));
    }

    pub fn image_accesses(&self) -> &[(K, ImageAccess)] {
        &self.image_accesses
    }

    pub fn is_empty(&self) -> bool {
        self.image_accesses.is_empty()
    }
}

impl<K> FromIterator<(K, ImageAccess)> for RenderOperation<K> {
    fn from_iter<T: IntoIterator<Item = (K, ImageAccess)>>(iter: T) -> Self {
        Self {
            image_accesses: iter.into_iter().collect(),
        }
    }
}
