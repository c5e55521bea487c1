// 📒 Kind Registry - kind name → typed constructor
//
// Built once at startup and handed to whoever needs it (the Store for
// reconstruction, the command layer for "does this kind exist?").
// Lookup is a plain map access: a kind name can only ever reach one of the
// constructors registered here.

use super::entity::{Entity, Record};
use super::kind::Kind;
use super::variants::{Amenity, Base, City, Place, Review, State, User, Variant};
use crate::error::{StoreError, StoreResult};
use std::collections::BTreeMap;
use std::fmt;

/// Builds an entity of one kind: fresh without a record, rebuilt with one
pub type Constructor = fn(Option<&Record>) -> StoreResult<Entity>;

fn construct<V: Variant>(raw: Option<&Record>) -> StoreResult<Entity> {
    match raw {
        None => Ok(Entity::new(V::KIND)),
        Some(record) => Entity::from_record(V::KIND, record),
    }
}

#[derive(Clone)]
pub struct KindRegistry {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl KindRegistry {
    /// Registry with all seven kinds
    pub fn new() -> Self {
        let mut registry = KindRegistry::empty();
        registry.register_default_kinds();
        registry
    }

    /// Registry with nothing registered
    pub fn empty() -> Self {
        KindRegistry {
            constructors: BTreeMap::new(),
        }
    }

    fn register_default_kinds(&mut self) {
        self.register::<Base>();
        self.register::<User>();
        self.register::<Amenity>();
        self.register::<City>();
        self.register::<Review>();
        self.register::<Place>();
        self.register::<State>();
    }

    /// Register (or replace) the constructor of one variant
    pub fn register<V: Variant>(&mut self) {
        self.constructors.insert(V::KIND.as_str(), construct::<V>);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> StoreResult<Kind> {
        if !self.contains(name) {
            return Err(StoreError::UnknownKind(name.to_string()));
        }
        Kind::from_name(name)
    }

    /// Registered kind names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Dispatch to the constructor registered under `name`
    pub fn construct(&self, name: &str, raw: Option<&Record>) -> StoreResult<Entity> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| StoreError::UnknownKind(name.to_string()))?;
        constructor(raw)
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_initialization() {
        let registry = KindRegistry::new();

        assert_eq!(registry.len(), 7);
        for kind in Kind::ALL {
            assert!(registry.contains(kind.as_str()));
        }
        assert!(!registry.contains("Vehicle"));
        assert!(!registry.contains("BaseModel"));
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = KindRegistry::new();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec!["Amenity", "City", "Entity", "Place", "Review", "State", "User"]
        );
    }

    #[test]
    fn test_construct_fresh() {
        let registry = KindRegistry::new();

        let review = registry.construct("Review", None).unwrap();
        assert_eq!(review.kind(), Kind::Review);
        assert_eq!(review.created_at(), review.updated_at());
    }

    #[test]
    fn test_construct_from_record() {
        let registry = KindRegistry::new();
        let raw = json!({
            "kind": "Amenity",
            "id": "wifi-1",
            "created_at": "2026-03-01T00:00:00Z",
            "updated_at": "2026-03-01T00:00:01Z",
            "name": "Wifi"
        });

        let amenity = registry
            .construct("Amenity", raw.as_object())
            .unwrap();
        assert_eq!(amenity.id(), "wifi-1");
        assert_eq!(amenity.kind(), Kind::Amenity);
    }

    #[test]
    fn test_construct_unknown_kind() {
        let registry = KindRegistry::new();
        let err = registry.construct("Vehicle", None).unwrap_err();
        assert!(matches!(err, StoreError::UnknownKind(ref k) if k == "Vehicle"));
    }

    #[test]
    fn test_partial_registry() {
        let mut registry = KindRegistry::empty();
        assert!(registry.is_empty());

        registry.register::<User>();
        assert!(registry.contains("User"));
        assert!(registry.kind("User").is_ok());

        // a real kind that was never registered is unknown to this registry
        assert!(matches!(registry.kind("Place"), Err(StoreError::UnknownKind(_))));
        assert!(registry.construct("Place", None).is_err());
    }
}
