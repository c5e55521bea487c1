// 🪪 Entity - identity + timestamps + typed body
//
// "The id is IDENTITY (never changes), everything else is a VALUE"
//
// Two ways in:
// - Entity::new(kind)              → fresh UUID, created_at == updated_at == now
// - Entity::from_record(kind, raw) → everything copied from the record, nothing generated
//
// One way out:
// - Entity::to_record()            → flat map of primitives, ready for JSON

use super::kind::Kind;
use super::variants::{Body, Variant};
use crate::attributes::AttributeValue;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Flat persisted form of one entity (keys sorted)
pub type Record = serde_json::Map<String, serde_json::Value>;

pub const KIND_FIELD: &str = "kind";
pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "created_at";
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Attribute names managed by the entity itself
pub const RESERVED_FIELDS: [&str; 4] = [KIND_FIELD, ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// Naive ISO form accepted on reparse (no offset, read as UTC)
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ============================================================================
// ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    // ========================================================================
    // IDENTITY (never changes)
    // ========================================================================
    id: String,

    // ========================================================================
    // TIMESTAMPS
    // ========================================================================
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    // ========================================================================
    // VALUES
    // ========================================================================
    /// Declared, typed fields of this kind
    body: Body,

    /// Attributes the kind does not declare; type fixed on first assignment
    extra: BTreeMap<String, AttributeValue>,
}

impl Entity {
    /// Create a brand new entity with a fresh UUID
    pub fn new(kind: Kind) -> Self {
        let now = now();

        Entity {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            body: Body::empty(kind),
            extra: BTreeMap::new(),
        }
    }

    /// Dual-mode constructor by kind name
    ///
    /// Without a record this is `Entity::new`; with one it is reconstruction.
    pub fn construct(kind_name: &str, raw: Option<&Record>) -> StoreResult<Self> {
        let kind = Kind::from_name(kind_name)?;
        match raw {
            None => Ok(Entity::new(kind)),
            Some(record) => Entity::from_record(kind, record),
        }
    }

    /// Rebuild an entity from its persisted record
    ///
    /// `id` and both timestamps are required. A `kind` entry, when present,
    /// must agree with `kind`. Declared fields must carry their declared type.
    pub fn from_record(kind: Kind, record: &Record) -> StoreResult<Self> {
        if let Some(tag) = record.get(KIND_FIELD) {
            match tag.as_str() {
                Some(name) if name == kind.as_str() => {}
                _ => {
                    return Err(StoreError::MalformedRecord(format!(
                        "record kind {} does not match {}",
                        tag, kind
                    )))
                }
            }
        }

        let id = match record.get(ID_FIELD) {
            Some(serde_json::Value::String(id)) if !id.is_empty() => id.clone(),
            Some(other) => {
                return Err(StoreError::MalformedRecord(format!(
                    "{} record has invalid id: {}",
                    kind, other
                )))
            }
            None => {
                return Err(StoreError::MalformedRecord(format!(
                    "{} record is missing id",
                    kind
                )))
            }
        };

        let created_at = required_timestamp(kind, record, CREATED_AT_FIELD)?;
        let updated_at = required_timestamp(kind, record, UPDATED_AT_FIELD)?;

        let mut entity = Entity {
            id,
            created_at,
            updated_at,
            body: Body::empty(kind),
            extra: BTreeMap::new(),
        };

        for (name, raw) in record {
            if RESERVED_FIELDS.contains(&name.as_str()) {
                continue;
            }
            let value = AttributeValue::from_json(name, raw)?;
            entity.assign(name, value).map_err(|e| {
                if matches!(e, StoreError::InvalidValue { .. }) {
                    StoreError::MalformedRecord(format!("{} {}: {}", kind, entity_id_hint(record), e))
                } else {
                    e
                }
            })?;
        }

        Ok(entity)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn kind(&self) -> Kind {
        self.body.kind()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Composite store key `<Kind>.<id>`
    pub fn key(&self) -> String {
        self.kind().key(&self.id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Typed view of the body, if this entity is of kind `V::KIND`
    pub fn variant<V: Variant>(&self) -> Option<&V> {
        V::of(&self.body)
    }

    /// Typed mutable access to the declared fields
    ///
    /// Fields set this way skip the string coercion of `update_attribute`.
    pub fn variant_mut<V: Variant>(&mut self) -> Option<&mut V> {
        V::of_mut(&mut self.body)
    }

    pub fn extra(&self) -> &BTreeMap<String, AttributeValue> {
        &self.extra
    }

    /// Read any attribute, reserved ones included (timestamps as text)
    pub fn get(&self, name: &str) -> Option<AttributeValue> {
        match name {
            KIND_FIELD => Some(AttributeValue::from(self.kind().as_str())),
            ID_FIELD => Some(AttributeValue::from(self.id.as_str())),
            CREATED_AT_FIELD => Some(AttributeValue::Text(format_timestamp(&self.created_at))),
            UPDATED_AT_FIELD => Some(AttributeValue::Text(format_timestamp(&self.updated_at))),
            _ => self.body.get(name).or_else(|| self.extra.get(name).cloned()),
        }
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Typed assignment
    pub fn set_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) -> StoreResult<()> {
        check_writable(name)?;
        self.assign(name, value.into())
    }

    /// Assignment from a raw string, coerced to the attribute's declared type
    ///
    /// - declared field   → its declared type
    /// - existing extra   → the type it already holds
    /// - new extra        → text
    ///
    /// On a coercion failure the entity is left unchanged.
    pub fn update_attribute(&mut self, name: &str, raw: &str) -> StoreResult<()> {
        check_writable(name)?;

        let value = if let Some(field) = self.body.field(name) {
            field.type_.coerce(name, raw)?
        } else if let Some(existing) = self.extra.get(name) {
            existing.attribute_type().coerce(name, raw)?
        } else {
            AttributeValue::Text(raw.to_string())
        };

        self.assign(name, value)
    }

    /// Refresh `updated_at`; always moves strictly forward
    pub fn touch(&mut self) {
        let now = now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    fn assign(&mut self, name: &str, value: AttributeValue) -> StoreResult<()> {
        if self.body.set(name, value.clone())? {
            return Ok(());
        }

        let value = match self.extra.get(name) {
            Some(existing) => existing.attribute_type().conform(name, value)?,
            None => value.attribute_type().conform(name, value)?,
        };
        self.extra.insert(name.to_string(), value);
        Ok(())
    }

    /// Check that every declared field holds a value its type accepts
    ///
    /// Fields written through `variant_mut` bypass `set_attribute`, so a
    /// non-finite float can only be caught here.
    pub fn validate(&self) -> StoreResult<()> {
        for field in self.body.fields() {
            if let Some(value) = self.body.get(field.name) {
                field.type_.conform(field.name, value)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // SERIALIZATION
    // ========================================================================

    /// Flat record: kind, id, timestamps, declared fields that are set, extras
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(KIND_FIELD.to_string(), self.kind().as_str().into());
        record.insert(ID_FIELD.to_string(), self.id.clone().into());
        record.insert(CREATED_AT_FIELD.to_string(), format_timestamp(&self.created_at).into());
        record.insert(UPDATED_AT_FIELD.to_string(), format_timestamp(&self.updated_at).into());

        for (name, value) in self.body.values() {
            record.insert(name.to_string(), value.to_json());
        }
        for (name, value) in &self.extra {
            record.insert(name.clone(), value.to_json());
        }

        record
    }
}

impl fmt::Display for Entity {
    /// `[Kind] (id) {"attr": value, ...}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut record = self.to_record();
        record.remove(KIND_FIELD);

        let attributes: Vec<String> = record
            .iter()
            .map(|(name, value)| format!("{}: {}", serde_json::Value::from(name.as_str()), value))
            .collect();

        write!(f, "[{}] ({}) {{{}}}", self.kind(), self.id, attributes.join(", "))
    }
}

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// Current time truncated to microseconds, the precision we persist
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Stable, reparsable form: RFC 3339, UTC, microseconds
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse RFC 3339, or the naive ISO form (read as UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn required_timestamp(kind: Kind, record: &Record, field: &str) -> StoreResult<DateTime<Utc>> {
    let raw = record.get(field).ok_or_else(|| {
        StoreError::MalformedRecord(format!("{} {} is missing {}", kind, entity_id_hint(record), field))
    })?;

    raw.as_str().and_then(parse_timestamp).ok_or_else(|| {
        StoreError::MalformedRecord(format!(
            "{} {} has unparsable {}: {}",
            kind,
            entity_id_hint(record),
            field,
            raw
        ))
    })
}

fn entity_id_hint(record: &Record) -> String {
    record
        .get(ID_FIELD)
        .and_then(|v| v.as_str())
        .unwrap_or("?")
        .to_string()
}

fn check_writable(name: &str) -> StoreResult<()> {
    if RESERVED_FIELDS.contains(&name) {
        return Err(StoreError::ReadOnlyAttribute(name.to_string()));
    }
    if name.is_empty() {
        return Err(StoreError::invalid_value(name, "attribute name is empty"));
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
