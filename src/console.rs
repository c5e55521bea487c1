// 🖥️ Console - thin command shell over the store
//
// Parses a line, checks the kind against the registry, calls the store and
// turns store errors into the classic "** ... **" messages.

use anyhow::Result;
use property_store::{Entity, Kind, Store, StoreError};
use std::collections::BTreeMap;
use std::io::Write;

pub const PROMPT: &str = "[mycli] ";

const HELP: &str = "\
Documented commands:
  create <Kind>                          create, save and print the new id
  show <Kind> <id>                       print one instance
  destroy <Kind> <id>                    delete one instance
  all [Kind]                             print every instance (of one kind)
  update <Kind> <id> <attribute> <value> set one attribute
  count <Kind>                           number of instances of a kind
  status                                 totals per kind
  clear_all <Kind>                       delete every instance of a kind
  backup                                 timestamped copy of the store file
  quit | exit                            leave";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    store: Store,
}

impl Console {
    pub fn new(store: Store) -> Self {
        Console { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run one input line
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let args = tokenize(line);
        self.dispatch(&args, out)
    }

    /// Run one already-split command
    pub fn dispatch<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<Flow> {
        let Some((command, rest)) = args.split_first() else {
            return Ok(Flow::Continue);
        };

        match command.as_str() {
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => writeln!(out, "{}", HELP)?,
            "create" => self.create(rest, out)?,
            "show" => self.show(rest, out)?,
            "destroy" => self.destroy(rest, out)?,
            "all" => self.all(rest, out)?,
            "update" => self.update(rest, out)?,
            "count" => self.count(rest, out)?,
            "status" => self.status(out)?,
            "clear_all" => self.clear_all(rest, out)?,
            "backup" => self.backup(out)?,
            _ => writeln!(out, "*** Unknown syntax: {}", args.join(" "))?,
        }

        Ok(Flow::Continue)
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    fn create<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<()> {
        let Some(kind) = self.require_kind(args, out)? else {
            return Ok(());
        };

        let entity = match self.store.registry().construct(kind.as_str(), None) {
            Ok(entity) => entity,
            Err(e) => {
                writeln!(out, "Error creating {}: {}", kind, e)?;
                return Ok(());
            }
        };
        let id = entity.id().to_string();

        match self.store.persist(entity) {
            Ok(_) => writeln!(out, "{}", id)?,
            Err(e) => writeln!(out, "Error creating {}: {}", kind, e)?,
        }
        Ok(())
    }

    fn show<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<()> {
        if let Some(entity) = self.require_instance(args, out)? {
            writeln!(out, "{}", entity)?;
        }
        Ok(())
    }

    fn destroy<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<()> {
        let Some(entity) = self.require_instance(args, out)? else {
            return Ok(());
        };

        let (kind, id) = (entity.kind(), entity.id().to_string());
        let removed = entity.clone();
        self.store.delete(kind, &id);

        if let Err(e) = self.store.save() {
            self.store.insert(removed);
            writeln!(out, "{}", describe(&e))?;
        }
        Ok(())
    }

    fn all<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<()> {
        let filter = match args.first() {
            None => None,
            Some(name) => match self.store.registry().kind(name) {
                Ok(kind) => Some(kind),
                Err(_) => {
                    writeln!(out, "** class doesn't exist **")?;
                    return Ok(());
                }
            },
        };

        for (key, entity) in self.store.all() {
            if filter.map_or(true, |kind| key.starts_with(&kind_prefix(kind))) {
                writeln!(out, "{}", entity)?;
            }
        }
        Ok(())
    }

    fn update<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<()> {
        let Some((kind, id)) = self.require_id(args, out)? else {
            return Ok(());
        };
        let Some(attribute) = args.get(2) else {
            writeln!(out, "** attribute name missing **")?;
            return Ok(());
        };
        let Some(value) = args.get(3) else {
            writeln!(out, "** value missing **")?;
            return Ok(());
        };
        let Some(entity) = self.store.get(kind, id) else {
            writeln!(out, "** no instance found **")?;
            return Ok(());
        };

        let mut updated = entity.clone();
        if let Err(e) = updated.update_attribute(attribute, value) {
            writeln!(out, "{}", describe(&e))?;
            return Ok(());
        }

        if let Err(e) = self.store.persist(updated) {
            writeln!(out, "{}", describe(&e))?;
        }
        Ok(())
    }

    fn count<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<()> {
        let Some(kind) = self.require_kind(args, out)? else {
            return Ok(());
        };

        let prefix = kind_prefix(kind);
        let count = self.store.all().keys().filter(|k| k.starts_with(&prefix)).count();
        writeln!(out, "{}", count)?;
        Ok(())
    }

    fn status<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let objects = self.store.all();
        writeln!(out, "Total objects in storage: {}", objects.len())?;

        let mut per_kind: BTreeMap<&str, usize> = BTreeMap::new();
        for entity in objects.values() {
            *per_kind.entry(entity.kind().as_str()).or_insert(0) += 1;
        }
        for (kind, count) in per_kind {
            writeln!(out, "{}: {}", kind, count)?;
        }
        Ok(())
    }

    fn clear_all<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<()> {
        let Some(kind) = self.require_kind(args, out)? else {
            return Ok(());
        };

        let doomed: Vec<Entity> = self
            .store
            .all()
            .values()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect();

        if doomed.is_empty() {
            writeln!(out, "No {} instances found", kind)?;
            return Ok(());
        }

        for entity in &doomed {
            self.store.delete(kind, entity.id());
        }

        match self.store.save() {
            Ok(()) => writeln!(out, "Deleted {} {} instances", doomed.len(), kind)?,
            Err(e) => {
                for entity in doomed {
                    self.store.insert(entity);
                }
                writeln!(out, "{}", describe(&e))?;
            }
        }
        Ok(())
    }

    fn backup<W: Write>(&mut self, out: &mut W) -> Result<()> {
        match self.store.backup() {
            Ok(Some(path)) => writeln!(out, "Backup created: {}", path.display())?,
            Ok(None) => writeln!(out, "No storage file found to backup")?,
            Err(e) => writeln!(out, "Backup failed: {}", e)?,
        }
        Ok(())
    }

    // ========================================================================
    // ARGUMENT CHECKS
    // ========================================================================

    /// First argument as a registered kind, or print why not
    fn require_kind<W: Write>(&self, args: &[String], out: &mut W) -> Result<Option<Kind>> {
        let Some(name) = args.first() else {
            writeln!(out, "** class name missing **")?;
            return Ok(None);
        };
        match self.store.registry().kind(name) {
            Ok(kind) => Ok(Some(kind)),
            Err(_) => {
                writeln!(out, "** class doesn't exist **")?;
                Ok(None)
            }
        }
    }

    /// `<Kind> <id>` checked for presence, not yet looked up
    fn require_id<'a, W: Write>(
        &self,
        args: &'a [String],
        out: &mut W,
    ) -> Result<Option<(Kind, &'a str)>> {
        let Some(kind) = self.require_kind(args, out)? else {
            return Ok(None);
        };
        match args.get(1) {
            Some(id) => Ok(Some((kind, id.as_str()))),
            None => {
                writeln!(out, "** instance id missing **")?;
                Ok(None)
            }
        }
    }

    /// `<Kind> <id>` resolved to a stored instance, or print why not
    fn require_instance<W: Write>(&self, args: &[String], out: &mut W) -> Result<Option<&Entity>> {
        let Some((kind, id)) = self.require_id(args, out)? else {
            return Ok(None);
        };
        match self.store.get(kind, id) {
            Some(entity) => Ok(Some(entity)),
            None => {
                writeln!(out, "** no instance found **")?;
                Ok(None)
            }
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn kind_prefix(kind: Kind) -> String {
    format!("{}.", kind)
}

/// User-facing text for a store error
fn describe(error: &StoreError) -> String {
    match error {
        StoreError::UnknownKind(_) => "** class doesn't exist **".to_string(),
        StoreError::InvalidValue { attribute, message } => {
            format!("** invalid value for {}: {} **", attribute, message)
        }
        StoreError::ReadOnlyAttribute(name) => format!("** attribute {} is read-only **", name),
        other => format!("Error: {}", other),
    }
}

/// Split on whitespace; double quotes group words and are dropped
pub fn tokenize(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }

    args
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use property_store::{AttributeValue, StoreConfig};

    fn console(dir: &tempfile::TempDir) -> Console {
        Console::new(Store::new(StoreConfig::new(dir.path().join("file.json"))))
    }

    fn run(console: &mut Console, line: &str) -> String {
        let mut out = Vec::new();
        console.execute(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("  show  User  42 "), vec!["show", "User", "42"]);
        assert_eq!(
            tokenize("update Place 1 name \"Golden Gate\""),
            vec!["update", "Place", "1", "name", "Golden Gate"]
        );
        assert_eq!(tokenize("update Place 1 name \"\""), vec!["update", "Place", "1", "name", ""]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_quit_and_empty_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);
        let mut out = Vec::new();

        assert_eq!(console.execute("", &mut out).unwrap(), Flow::Continue);
        assert_eq!(console.execute("quit", &mut out).unwrap(), Flow::Quit);
        assert_eq!(console.execute("exit", &mut out).unwrap(), Flow::Quit);
        assert!(out.is_empty());
    }

    #[test]
    fn test_create_validations() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);

        assert_eq!(run(&mut console, "create"), "** class name missing **\n");
        assert_eq!(run(&mut console, "create Vehicle"), "** class doesn't exist **\n");
        assert!(console.store().all().is_empty());
    }

    #[test]
    fn test_create_persists_and_prints_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);

        let id = run(&mut console, "create City").trim().to_string();

        assert!(console.store().get(Kind::City, &id).is_some());
        assert!(dir.path().join("file.json").exists());
        assert!(run(&mut console, &format!("show City {}", id)).starts_with(&format!("[City] ({})", id)));
    }

    #[test]
    fn test_show_and_destroy_messages() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);

        assert_eq!(run(&mut console, "show User"), "** instance id missing **\n");
        assert_eq!(run(&mut console, "show User nope"), "** no instance found **\n");
        assert_eq!(run(&mut console, "destroy User nope"), "** no instance found **\n");

        let id = run(&mut console, "create User").trim().to_string();
        assert_eq!(run(&mut console, &format!("destroy User {}", id)), "");
        assert!(console.store().all().is_empty());
    }

    #[test]
    fn test_update_coerces_declared_types() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);
        let id = run(&mut console, "create Place").trim().to_string();

        assert_eq!(run(&mut console, &format!("update Place {}", id)), "** attribute name missing **\n");
        assert_eq!(
            run(&mut console, &format!("update Place {} max_guest", id)),
            "** value missing **\n"
        );

        assert_eq!(run(&mut console, &format!("update Place {} max_guest 4", id)), "");
        assert_eq!(
            run(&mut console, &format!("update Place {} name \"Sea View\"", id)),
            ""
        );

        let place = console.store().get(Kind::Place, &id).unwrap();
        assert_eq!(place.get("max_guest"), Some(AttributeValue::Integer(4)));
        assert_eq!(place.get("name"), Some(AttributeValue::from("Sea View")));
        assert!(place.updated_at() > place.created_at());
    }

    #[test]
    fn test_update_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);
        let id = run(&mut console, "create Place").trim().to_string();

        let out = run(&mut console, &format!("update Place {} max_guest many", id));
        assert!(out.starts_with("** invalid value for max_guest"));

        let out = run(&mut console, &format!("update Place {} id other", id));
        assert_eq!(out, "** attribute id is read-only **\n");

        let place = console.store().get(Kind::Place, &id).unwrap();
        assert_eq!(place.get("max_guest"), None);
    }

    #[test]
    fn test_update_reports_missing_arguments_before_missing_instance() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);

        assert_eq!(run(&mut console, "update User ghost"), "** attribute name missing **\n");
        assert_eq!(run(&mut console, "update User ghost email"), "** value missing **\n");
        assert_eq!(
            run(&mut console, "update User ghost email a@b.c"),
            "** no instance found **\n"
        );
    }

    #[test]
    fn test_all_count_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);
        run(&mut console, "create User");
        run(&mut console, "create User");
        run(&mut console, "create State");

        assert_eq!(run(&mut console, "count User"), "2\n");
        assert_eq!(run(&mut console, "count Review"), "0\n");
        assert_eq!(run(&mut console, "all User").lines().count(), 2);
        assert_eq!(run(&mut console, "all").lines().count(), 3);
        assert_eq!(run(&mut console, "all Vehicle"), "** class doesn't exist **\n");
        assert_eq!(
            run(&mut console, "status"),
            "Total objects in storage: 3\nState: 1\nUser: 2\n"
        );
    }

    #[test]
    fn test_clear_all() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);
        run(&mut console, "create Amenity");
        run(&mut console, "create Amenity");
        run(&mut console, "create City");

        assert_eq!(run(&mut console, "clear_all Amenity"), "Deleted 2 Amenity instances\n");
        assert_eq!(run(&mut console, "clear_all Amenity"), "No Amenity instances found\n");
        assert_eq!(console.store().all().len(), 1);
    }

    #[test]
    fn test_backup_messages() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);

        assert_eq!(run(&mut console, "backup"), "No storage file found to backup\n");
        run(&mut console, "create Review");
        assert!(run(&mut console, "backup").starts_with("Backup created: "));
    }

    #[test]
    fn test_unknown_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(&dir);
        assert_eq!(run(&mut console, "fly away"), "*** Unknown syntax: fly away\n");
    }
}
