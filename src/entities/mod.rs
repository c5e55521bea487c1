// Entity Models
// "Identity persists, values change"
//
// Each entity has:
// - Stable identity (UUID) that NEVER changes
// - created_at / updated_at timestamps
// - A closed, typed body per kind, plus a side-table for extra attributes
// - A registry entry so raw records can be turned back into typed values

pub mod entity;
pub mod kind;
pub mod registry;
pub mod variants;

pub use entity::{format_timestamp, parse_timestamp, Entity, Record, RESERVED_FIELDS};
pub use kind::Kind;
pub use registry::{Constructor, KindRegistry};
pub use variants::{Amenity, Base, Body, City, Place, Review, State, User, Variant};
