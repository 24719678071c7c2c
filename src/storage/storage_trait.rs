//! Storage Trait
//!
//! This module defines the `ImageStore` trait, the interface between the
//! capture flow and whatever persists captured images.
//!
//! Implementors are responsible for:
//! - Persisting one image record per call, without deduplication
//! - Returning the records stored for a user
//!
//! All methods return a `Result` so callers can react to storage failures.

use crate::error_handling::types::StorageError;
use crate::storage::types::ImageRecord;

pub trait ImageStore {
    /// Stores `image` for `user_id`. Repeated calls with the same user append
    /// new records.
    ///
    /// - `user_id` - identifier the image belongs to.
    /// - `image` - raw file bytes; must not be empty.
    fn save_image(&self, user_id: &str, image: &[u8]) -> Result<(), StorageError>;

    /// Retrieves every record stored for `user_id`.
    fn get_images(&self, user_id: &str) -> Result<Vec<ImageRecord>, StorageError>;
}
