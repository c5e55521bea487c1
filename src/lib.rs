// Property Store - Core Library
// Typed entities, a kind registry and a single-file JSON store.
// Exposes all modules for use by the console and by tests.

pub mod attributes;
pub mod config;
pub mod entities;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use attributes::{AttributeType, AttributeValue, FieldSpec, Scalar};
pub use config::{StoreConfig, BACKUP_DIR_ENV, DEFAULT_STORE_FILE, STORE_FILE_ENV};
pub use entities::{
    Amenity, Base, Body, City, Constructor, Entity, Kind, KindRegistry, Place, Record, Review,
    State, User, Variant,
};
pub use error::{StoreError, StoreResult};
pub use store::Store;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
