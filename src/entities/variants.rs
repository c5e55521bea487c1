// 🧩 Entity Variants - closed, typed per-kind fields
//
// Each kind declares its fields exactly once, here. The declared type of a
// field is what UpdateAttribute coerces to; there is no runtime inference.

use super::kind::Kind;
use crate::attributes::{AttributeValue, FieldSpec, Scalar};
use crate::error::StoreResult;

// ============================================================================
// VARIANT CONTRACT
// ============================================================================

/// Typed body of one entity kind
pub trait Variant: Default + Into<Body> {
    const KIND: Kind;
    const FIELDS: &'static [FieldSpec];

    /// Current value of a declared field (None when unset or undeclared)
    fn get(&self, name: &str) -> Option<AttributeValue>;

    /// Type-checked assignment; Ok(false) when `name` is not declared
    fn set(&mut self, name: &str, value: AttributeValue) -> StoreResult<bool>;

    fn of(body: &Body) -> Option<&Self>;

    fn of_mut(body: &mut Body) -> Option<&mut Self>;
}

macro_rules! variant {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: Option<$ty>, )*
        }

        impl Variant for $name {
            const KIND: Kind = Kind::$kind;
            const FIELDS: &'static [FieldSpec] = &[
                $( FieldSpec { name: stringify!($field), type_: <$ty as Scalar>::TYPE }, )*
            ];

            fn get(&self, name: &str) -> Option<AttributeValue> {
                $(
                    if name == stringify!($field) {
                        return self.$field.clone().map(<$ty as Scalar>::into_value);
                    }
                )*
                let _ = name;
                None
            }

            fn set(&mut self, name: &str, value: AttributeValue) -> StoreResult<bool> {
                $(
                    if name == stringify!($field) {
                        let value = <$ty as Scalar>::TYPE.conform(name, value)?;
                        self.$field = <$ty as Scalar>::from_value(value);
                        return Ok(true);
                    }
                )*
                let _ = (name, value);
                Ok(false)
            }

            fn of(body: &Body) -> Option<&Self> {
                match body {
                    Body::$kind(variant) => Some(variant),
                    _ => None,
                }
            }

            fn of_mut(body: &mut Body) -> Option<&mut Self> {
                match body {
                    Body::$kind(variant) => Some(variant),
                    _ => None,
                }
            }
        }

        impl From<$name> for Body {
            fn from(variant: $name) -> Body {
                Body::$kind(variant)
            }
        }
    };
}

// ============================================================================
// VARIANTS
// ============================================================================

variant! {
    /// Generic base entity: identity and timestamps only
    Base => Entity {}
}

variant! {
    User => User {
        email: String,
        password: String,
        first_name: String,
        last_name: String,
    }
}

variant! {
    State => State {
        name: String,
    }
}

variant! {
    City => City {
        /// Id of the owning State
        state_id: String,
        name: String,
    }
}

variant! {
    Amenity => Amenity {
        name: String,
    }
}

variant! {
    Place => Place {
        city_id: String,
        /// Id of the owning User
        user_id: String,
        name: String,
        description: String,
        number_rooms: i64,
        number_bathrooms: i64,
        max_guest: i64,
        price_by_night: i64,
        latitude: f64,
        longitude: f64,
    }
}

variant! {
    Review => Review {
        place_id: String,
        user_id: String,
        text: String,
    }
}

// ============================================================================
// BODY (tagged union over all variants)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Entity(Base),
    User(User),
    Amenity(Amenity),
    City(City),
    Review(Review),
    Place(Place),
    State(State),
}

impl Body {
    /// Empty body for a kind
    pub fn empty(kind: Kind) -> Body {
        match kind {
            Kind::Entity => Base::default().into(),
            Kind::User => User::default().into(),
            Kind::Amenity => Amenity::default().into(),
            Kind::City => City::default().into(),
            Kind::Review => Review::default().into(),
            Kind::Place => Place::default().into(),
            Kind::State => State::default().into(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Body::Entity(_) => Base::KIND,
            Body::User(_) => User::KIND,
            Body::Amenity(_) => Amenity::KIND,
            Body::City(_) => City::KIND,
            Body::Review(_) => Review::KIND,
            Body::Place(_) => Place::KIND,
            Body::State(_) => State::KIND,
        }
    }

    /// Declared fields of this body's kind
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Body::Entity(_) => Base::FIELDS,
            Body::User(_) => User::FIELDS,
            Body::Amenity(_) => Amenity::FIELDS,
            Body::City(_) => City::FIELDS,
            Body::Review(_) => Review::FIELDS,
            Body::Place(_) => Place::FIELDS,
            Body::State(_) => State::FIELDS,
        }
    }

    pub fn field(&self, name: &str) -> Option<FieldSpec> {
        self.fields().iter().copied().find(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<AttributeValue> {
        match self {
            Body::Entity(v) => v.get(name),
            Body::User(v) => v.get(name),
            Body::Amenity(v) => v.get(name),
            Body::City(v) => v.get(name),
            Body::Review(v) => v.get(name),
            Body::Place(v) => v.get(name),
            Body::State(v) => v.get(name),
        }
    }

    pub fn set(&mut self, name: &str, value: AttributeValue) -> StoreResult<bool> {
        match self {
            Body::Entity(v) => v.set(name, value),
            Body::User(v) => v.set(name, value),
            Body::Amenity(v) => v.set(name, value),
            Body::City(v) => v.set(name, value),
            Body::Review(v) => v.set(name, value),
            Body::Place(v) => v.set(name, value),
            Body::State(v) => v.set(name, value),
        }
    }

    /// Declared fields that currently hold a value, in declaration order
    pub fn values(&self) -> Vec<(&'static str, AttributeValue)> {
        self.fields()
            .iter()
            .filter_map(|f| self.get(f.name).map(|v| (f.name, v)))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
