//! Storage subsystem
//!
//! This module provides the persistence side of the capture flow.
//!
//! Components:
//! - `storage_trait`: the `ImageStore` trait defining a uniform API.
//! - `types`: the `ImageRecord` row type.
//! - `database_storage`: relational implementation (MySQL or SQLite) using SeaORM.

pub mod database_storage;
pub mod storage_trait;
pub mod types;

pub use database_storage::DatabaseStorage;
pub use storage_trait::ImageStore;
pub use types::ImageRecord;
