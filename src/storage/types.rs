/// A stored row of `user_images`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub user_id: String,
    /// Raw image file bytes, unmodified.
    pub image: Vec<u8>,
}

impl ImageRecord {
    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}
