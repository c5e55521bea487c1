// 🗄️ Store - the in-memory registry and its durable JSON snapshot
//
// The store OWNS every entity. The durable file is the only thing that
// survives the process:
//
//   {
//     "City.<id>":  { "kind": "City", "id": "<id>", "created_at": ..., ... },
//     "User.<id>":  { ... }
//   }
//
// Save rewrites the whole file through a temp file + rename, so a reader
// never sees half a snapshot. Reload is all-or-nothing.

use crate::config::{parent_dir, StoreConfig};
use crate::entities::entity::KIND_FIELD;
use crate::entities::{Entity, Kind, KindRegistry};
use crate::error::{StoreError, StoreResult};
use chrono::Local;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
pub struct Store {
    config: StoreConfig,

    /// Consulted by reload to turn records back into typed entities
    registry: KindRegistry,

    /// `<Kind>.<id>` → entity; ordered so snapshots are byte-stable
    objects: BTreeMap<String, Entity>,
}

impl Store {
    /// Empty store with every kind registered; nothing is read from disk
    pub fn new(config: StoreConfig) -> Self {
        Self::with_registry(config, KindRegistry::new())
    }

    pub fn with_registry(config: StoreConfig, registry: KindRegistry) -> Self {
        Store {
            config,
            registry,
            objects: BTreeMap::new(),
        }
    }

    /// New store, reloaded from the durable file if there is one
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let mut store = Self::new(config);
        store.reload()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    // ========================================================================
    // IN-MEMORY ACCESS
    // ========================================================================

    /// Read view of the whole mapping
    ///
    /// Per-kind listing and counting is done by callers, e.g. by filtering
    /// keys on the `"<Kind>."` prefix.
    pub fn all(&self) -> &BTreeMap<String, Entity> {
        &self.objects
    }

    pub fn get(&self, kind: Kind, id: &str) -> Option<&Entity> {
        self.objects.get(&kind.key(id))
    }

    pub fn get_mut(&mut self, kind: Kind, id: &str) -> Option<&mut Entity> {
        self.objects.get_mut(&kind.key(id))
    }

    /// Register an entity under `<Kind>.<id>`, replacing any previous one
    ///
    /// Memory only; call `save` to make it durable.
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        let key = entity.key();
        debug!(%key, "entity registered");
        self.objects.insert(key, entity)
    }

    /// Remove an entity; false when there was nothing to remove
    pub fn delete(&mut self, kind: Kind, id: &str) -> bool {
        let key = kind.key(id);
        let removed = self.objects.remove(&key).is_some();
        debug!(%key, removed, "entity delete");
        removed
    }

    /// Mutation-and-save cycle: touch, register, save
    ///
    /// When the save fails the mapping is put back the way it was.
    pub fn persist(&mut self, mut entity: Entity) -> StoreResult<String> {
        entity.touch();
        let key = entity.key();
        let previous = self.objects.insert(key.clone(), entity);

        if let Err(e) = self.save() {
            match previous {
                Some(previous) => self.objects.insert(key, previous),
                None => self.objects.remove(&key),
            };
            return Err(e);
        }

        Ok(key)
    }

    // ========================================================================
    // DURABLE FILE
    // ========================================================================

    /// The snapshot `save` would write, as text
    ///
    /// Fails with InvalidValue if any entity holds a value reload would reject.
    pub fn snapshot(&self) -> StoreResult<String> {
        let mut aggregate = serde_json::Map::new();
        for (key, entity) in &self.objects {
            if let Err(e) = entity.validate() {
                warn!(%key, error = %e, "entity cannot be saved");
                return Err(e);
            }
            aggregate.insert(key.clone(), Value::Object(entity.to_record()));
        }

        serde_json::to_string_pretty(&Value::Object(aggregate))
            .map_err(|e| StoreError::persistence(&self.config.path, io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Atomically rewrite the durable file with every entity in memory
    #[instrument(skip(self), fields(path = %self.config.path.display()))]
    pub fn save(&self) -> StoreResult<()> {
        let contents = self.snapshot()?;
        write_atomic(&self.config.path, contents.as_bytes())?;

        info!(count = self.objects.len(), "store saved");
        Ok(())
    }

    /// Replace the mapping with the contents of the durable file
    ///
    /// - no file          → Ok(0), mapping untouched
    /// - unparsable file  → CorruptStore, mapping untouched
    /// - bad record       → MalformedRecord / UnknownKind, mapping untouched
    ///
    /// Returns the number of entities loaded.
    #[instrument(skip(self), fields(path = %self.config.path.display()))]
    pub fn reload(&mut self) -> StoreResult<usize> {
        let path = self.config.path.clone();

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("no durable file yet, keeping current state");
                return Ok(0);
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(StoreError::corrupt(&path, format!("not UTF-8 text: {}", e)));
            }
            Err(e) => return Err(StoreError::persistence(&path, e)),
        };

        let objects = self.decode(&path, &contents)?;
        let count = objects.len();
        self.objects = objects;

        info!(count, "store reloaded");
        Ok(count)
    }

    /// Parse a snapshot into a fresh mapping without touching `self.objects`
    fn decode(&self, path: &Path, contents: &str) -> StoreResult<BTreeMap<String, Entity>> {
        let aggregate = match serde_json::from_str::<Value>(contents) {
            Ok(Value::Object(aggregate)) => aggregate,
            Ok(other) => {
                return Err(StoreError::corrupt(
                    path,
                    format!("expected a JSON object at top level, found {}", json_type(&other)),
                ))
            }
            Err(e) => return Err(StoreError::corrupt(path, e.to_string())),
        };

        let mut objects = BTreeMap::new();
        for (key, raw) in aggregate {
            let record = match raw {
                Value::Object(record) => record,
                other => {
                    return Err(StoreError::corrupt(
                        path,
                        format!("entry {} is a {}, not an object", key, json_type(&other)),
                    ))
                }
            };

            let kind_name = record
                .get(KIND_FIELD)
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::MalformedRecord(format!("entry {} has no kind", key)))?;

            let entity = self.registry.construct(kind_name, Some(&record))?;
            if entity.key() != key {
                return Err(StoreError::MalformedRecord(format!(
                    "entry {} holds {}",
                    key,
                    entity.key()
                )));
            }

            objects.insert(key, entity);
        }

        Ok(objects)
    }

    /// Copy the durable file to `<stem>_backup_<YYYYmmdd_HHMMSS>.json`
    ///
    /// Returns None when there is no durable file yet. The in-memory
    /// mapping plays no part: the backup is whatever `save` last wrote.
    #[instrument(skip(self), fields(path = %self.config.path.display()))]
    pub fn backup(&self) -> StoreResult<Option<PathBuf>> {
        let source = &self.config.path;
        if !source.exists() {
            info!("no durable file to back up");
            return Ok(None);
        }

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("store");
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let target = self
            .config
            .backup_dir()
            .join(format!("{}_backup_{}.json", stem, stamp));

        fs::copy(source, &target).map_err(|e| StoreError::persistence(&target, e))?;

        info!(backup = %target.display(), "backup created");
        Ok(Some(target))
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Write to a temp file in the target's directory, then rename over it
fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let dir = parent_dir(path);

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StoreError::persistence(&dir, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| StoreError::persistence(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::persistence(path, e.error))?;

    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// TESTS
// ============================================================================
