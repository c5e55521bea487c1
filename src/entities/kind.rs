// 🏷️ Kind - the tag that tells entity variants apart

use crate::error::{StoreError, StoreResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// Generic base entity with no declared fields
    Entity,
    User,
    Amenity,
    City,
    Review,
    Place,
    State,
}

impl Kind {
    /// Every kind, in registration order
    pub const ALL: [Kind; 7] = [
        Kind::Entity,
        Kind::User,
        Kind::Amenity,
        Kind::City,
        Kind::Review,
        Kind::Place,
        Kind::State,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Entity => "Entity",
            Kind::User => "User",
            Kind::Amenity => "Amenity",
            Kind::City => "City",
            Kind::Review => "Review",
            Kind::Place => "Place",
            Kind::State => "State",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn from_name(name: &str) -> StoreResult<Kind> {
        Kind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| StoreError::UnknownKind(name.to_string()))
    }

    /// Composite store key `<Kind>.<id>`
    pub fn key(&self, id: &str) -> String {
        format!("{}.{}", self.as_str(), id)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::from_name(s)
    }
}
