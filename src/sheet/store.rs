//! File-backed character sheet store.
//!
//! Layout: `<root>/<user>/<uuid>.json` per sheet plus `<root>/<user>/current.txt`
//! holding the id of the active sheet. There is no locking; the last write wins.

use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::common::error::{DiceError, SheetError, SheetResult};
use crate::dice::{evaluate, Dice, DiceLimits};
use crate::sheet::{validate_name, AttributeParser, CharacterSheet};

const CURRENT_FILE: &str = "current.txt";

/// Outcome of `st update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub attribute: String,
    pub old: i64,
    pub new: i64,
    /// Roll breakdown when the value involved dice.
    pub breakdown: Option<String>,
}

/// Character sheets of every user, stored under one root directory.
#[derive(Debug)]
pub struct SheetStore {
    root: PathBuf,
    parser: AttributeParser,
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SheetError + '_ {
    move |source| SheetError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Map a platform user id onto a directory name, one directory per id.
fn sanitize_user(user: &str) -> String {
    if user.is_empty() {
        return "_".to_string();
    }
    utf8_percent_encode(user, NON_ALPHANUMERIC).to_string()
}

impl SheetStore {
    pub fn new(root: impl Into<PathBuf>) -> SheetResult<Self> {
        Ok(Self {
            root: root.into(),
            parser: AttributeParser::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user: &str) -> PathBuf {
        self.root.join(sanitize_user(user))
    }

    fn sheet_path(&self, user: &str, id: &str) -> PathBuf {
        self.user_dir(user).join(format!("{}.json", id))
    }

    fn current_path(&self, user: &str) -> PathBuf {
        self.user_dir(user).join(CURRENT_FILE)
    }

    /// All sheets of `user`, sorted by name. Unreadable files are skipped.
    pub async fn list(&self, user: &str) -> SheetResult<Vec<CharacterSheet>> {
        let dir = self.user_dir(user);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir)(e)),
        };

        let mut sheets = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&dir))? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read_sheet(&path).await {
                Ok(sheet) => sheets.push(sheet),
                Err(e) => warn!("Skipping unreadable character file: {}", e),
            }
        }

        sheets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sheets)
    }

    /// Load a sheet by id. `None` if it does not exist.
    pub async fn load(&self, user: &str, id: &str) -> SheetResult<Option<CharacterSheet>> {
        if Uuid::parse_str(id).is_err() {
            debug!("Ignoring malformed sheet id '{}'", id);
            return Ok(None);
        }

        let path = self.sheet_path(user, id);
        match read_sheet(&path).await {
            Ok(sheet) => Ok(Some(sheet)),
            Err(SheetError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Write a sheet as pretty-printed JSON.
    pub async fn save(&self, user: &str, sheet: &CharacterSheet) -> SheetResult<()> {
        let dir = self.user_dir(user);
        fs::create_dir_all(&dir).await.map_err(io_error(&dir))?;

        let path = self.sheet_path(user, &sheet.id);
        let content = serde_json::to_string_pretty(sheet).map_err(|source| SheetError::Json {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(&path, content).await.map_err(io_error(&path))
    }

    /// Create a sheet from free-form attribute text and make it current.
    pub async fn create(&self, user: &str, name: &str, text: &str) -> SheetResult<CharacterSheet> {
        validate_name(name)?;
        if self.find(user, name).await?.is_some() {
            return Err(SheetError::DuplicateName {
                name: name.to_string(),
            });
        }

        let attributes = self.parser.parse(text)?;
        let sheet = CharacterSheet::new(name, attributes);
        self.save(user, &sheet).await?;
        self.set_current(user, &sheet.id).await?;

        info!("User {} created character '{}' ({})", user, sheet.name, sheet.id);
        Ok(sheet)
    }

    async fn find(&self, user: &str, name: &str) -> SheetResult<Option<CharacterSheet>> {
        Ok(self
            .list(user)
            .await?
            .into_iter()
            .find(|sheet| sheet.name == name))
    }

    async fn set_current(&self, user: &str, id: &str) -> SheetResult<()> {
        let path = self.current_path(user);
        fs::write(&path, id).await.map_err(io_error(&path))
    }

    /// Id named by the pointer file, if any.
    pub async fn current_id(&self, user: &str) -> SheetResult<Option<String>> {
        let path = self.current_path(user);
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    /// The active sheet. `None` if unset or dangling.
    pub async fn current(&self, user: &str) -> SheetResult<Option<CharacterSheet>> {
        match self.current_id(user).await? {
            Some(id) => self.load(user, &id).await,
            None => Ok(None),
        }
    }

    pub async fn require_current(&self, user: &str) -> SheetResult<CharacterSheet> {
        self.current(user).await?.ok_or(SheetError::NoCurrent)
    }

    /// Make the sheet called `name` the active one.
    pub async fn switch_current(&self, user: &str, name: &str) -> SheetResult<CharacterSheet> {
        let sheet = self.find(user, name).await?.ok_or_else(|| SheetError::NotFound {
            name: name.to_string(),
        })?;
        self.set_current(user, &sheet.id).await?;
        Ok(sheet)
    }

    /// Apply `[+|-|*]expr` to an attribute of the active sheet. Without an
    /// operator the value is assigned. The stored result never drops below 0.
    pub async fn update_attribute(
        &self,
        user: &str,
        attribute: &str,
        value: &str,
        dice: &dyn Dice,
        limits: &DiceLimits,
    ) -> SheetResult<AttributeChange> {
        let mut sheet = self.require_current(user).await?;
        let attribute = attribute.to_lowercase();
        let old = sheet
            .attributes
            .get(&attribute)
            .copied()
            .ok_or_else(|| SheetError::UnknownAttribute {
                name: attribute.clone(),
            })?;

        let value = value.trim();
        let (operator, expression) = match value.chars().next() {
            Some(op @ ('+' | '-' | '*')) => (Some(op), &value[1..]),
            _ => (None, value),
        };
        if expression.is_empty() {
            return Err(SheetError::InvalidValue {
                value: value.to_string(),
                reason: "missing amount".to_string(),
            });
        }

        let outcome = evaluate(expression, dice, limits)?;
        if outcome.totals.len() > 1 {
            return Err(SheetError::InvalidValue {
                value: value.to_string(),
                reason: "repeated rolls are not allowed here".to_string(),
            });
        }
        let amount = outcome.total();

        let computed = match operator {
            Some('+') => old.checked_add(amount),
            Some('-') => old.checked_sub(amount),
            Some('*') => old.checked_mul(amount),
            _ => Some(amount),
        }
        .ok_or(DiceError::Overflow)?;
        let new = computed.max(0);

        sheet.attributes.insert(attribute.clone(), new);
        self.save(user, &sheet).await?;

        Ok(AttributeChange {
            attribute,
            old,
            new,
            breakdown: outcome.rolled_dice.then(|| outcome.description()),
        })
    }

    /// Delete the sheet called `name`, clearing the pointer if it was active.
    pub async fn delete(&self, user: &str, name: &str) -> SheetResult<CharacterSheet> {
        let sheet = self.find(user, name).await?.ok_or_else(|| SheetError::NotFound {
            name: name.to_string(),
        })?;

        let path = self.sheet_path(user, &sheet.id);
        fs::remove_file(&path).await.map_err(io_error(&path))?;

        if self.current_id(user).await?.as_deref() == Some(sheet.id.as_str()) {
            let current = self.current_path(user);
            fs::remove_file(&current).await.map_err(io_error(&current))?;
        }

        info!("User {} deleted character '{}' ({})", user, sheet.name, sheet.id);
        Ok(sheet)
    }

    /// Attribute of the active sheet, 0 when missing or when no sheet is active.
    pub async fn attribute_value(&self, user: &str, attribute: &str) -> SheetResult<i64> {
        Ok(self
            .current(user)
            .await?
            .and_then(|sheet| sheet.attribute(attribute))
            .unwrap_or(0))
    }
}

async fn read_sheet(path: &Path) -> SheetResult<CharacterSheet> {
    let content = fs::read_to_string(path).await.map_err(io_error(path))?;
    serde_json::from_str(&content).map_err(|source| SheetError::Json {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use tempfile::TempDir;

    fn store() -> (TempDir, SheetStore) {
        let dir = TempDir::new().unwrap();
        let store = SheetStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_sanitize_user() {
        assert_eq!(sanitize_user("123456789"), "123456789");
        assert_eq!(sanitize_user("../etc"), "%2E%2E%2Fetc");
        assert_eq!(sanitize_user("a_b"), "a%5Fb");
        assert_eq!(sanitize_user(""), "_");
        assert_ne!(sanitize_user("a.b"), sanitize_user("a_b"));
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let (_dir, store) = store();
        let sheet = store.create("42", "Alice", "str60 dex50 hp12 san55").await.unwrap();

        let loaded = store.load("42", &sheet.id).await.unwrap().unwrap();
        assert_eq!(loaded, sheet);
        assert_eq!(loaded.attributes, sheet.attributes);
    }

    #[tokio::test]
    async fn test_create_sets_current_and_rejects_duplicates() {
        let (_dir, store) = store();
        let sheet = store.create("42", "Alice", "hp12").await.unwrap();
        assert_eq!(store.current_id("42").await.unwrap(), Some(sheet.id.clone()));

        let err = store.create("42", "Alice", "hp10").await.unwrap_err();
        assert!(matches!(err, SheetError::DuplicateName { .. }));

        // Names are per user.
        assert!(store.create("43", "Alice", "hp10").await.is_ok());
    }

    #[tokio::test]
    async fn test_list_sorted_and_skips_corrupt() {
        let (dir, store) = store();
        store.create("42", "Zed", "hp1").await.unwrap();
        store.create("42", "Alice", "hp1").await.unwrap();
        std::fs::write(dir.path().join("42").join("broken.json"), "{not json").unwrap();

        let names: Vec<String> = store
            .list("42")
            .await
            .unwrap()
            .into_iter()
            .map(|sheet| sheet.name)
            .collect();
        assert_eq!(names, vec!["Alice", "Zed"]);
        assert!(store.list("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_similar_user_ids_do_not_share_sheets() {
        let (_dir, store) = store();
        store.create("a.b", "Alice", "hp1").await.unwrap();

        assert!(store.list("a_b").await.unwrap().is_empty());
        assert!(store.current("a_b").await.unwrap().is_none());
        assert_eq!(store.list("a.b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_switch_current() {
        let (_dir, store) = store();
        let alice = store.create("42", "Alice", "hp1").await.unwrap();
        store.create("42", "Bob", "hp2").await.unwrap();

        let switched = store.switch_current("42", "Alice").await.unwrap();
        assert_eq!(switched.id, alice.id);
        assert_eq!(store.require_current("42").await.unwrap().name, "Alice");

        let err = store.switch_current("42", "Carol").await.unwrap_err();
        assert!(matches!(err, SheetError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_no_current() {
        let (_dir, store) = store();
        assert!(store.current("42").await.unwrap().is_none());
        assert!(matches!(
            store.require_current("42").await.unwrap_err(),
            SheetError::NoCurrent
        ));
        assert_eq!(store.attribute_value("42", "san").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_attribute_operators() {
        let (_dir, store) = store();
        store.create("42", "Alice", "hp10 san50").await.unwrap();
        let dice = ScriptedDice::new([3]);
        let limits = DiceLimits::default();

        let change = store.update_attribute("42", "HP", "-4", &dice, &limits).await.unwrap();
        assert_eq!((change.old, change.new), (10, 6));
        assert!(change.breakdown.is_none());

        let change = store.update_attribute("42", "hp", "*2", &dice, &limits).await.unwrap();
        assert_eq!(change.new, 12);

        let change = store.update_attribute("42", "hp", "+1d6", &dice, &limits).await.unwrap();
        assert_eq!(change.new, 15);
        assert_eq!(change.breakdown.as_deref(), Some("[3] = 3"));

        let change = store.update_attribute("42", "hp", "7", &dice, &limits).await.unwrap();
        assert_eq!(change.new, 7);
        assert_eq!(store.attribute_value("42", "hp").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_update_attribute_clamps_at_zero() {
        let (_dir, store) = store();
        store.create("42", "Alice", "hp3").await.unwrap();
        let dice = ScriptedDice::new([1]);

        let change = store
            .update_attribute("42", "hp", "-10", &dice, &DiceLimits::default())
            .await
            .unwrap();
        assert_eq!(change.new, 0);
    }

    #[tokio::test]
    async fn test_update_attribute_errors() {
        let (_dir, store) = store();
        let dice = ScriptedDice::new([1]);
        let limits = DiceLimits::default();

        let err = store.update_attribute("42", "hp", "1", &dice, &limits).await.unwrap_err();
        assert!(matches!(err, SheetError::NoCurrent));

        store.create("42", "Alice", "hp3").await.unwrap();
        let err = store.update_attribute("42", "luck", "1", &dice, &limits).await.unwrap_err();
        assert!(matches!(err, SheetError::UnknownAttribute { .. }));

        let err = store.update_attribute("42", "hp", "+", &dice, &limits).await.unwrap_err();
        assert!(matches!(err, SheetError::InvalidValue { .. }));

        let err = store.update_attribute("42", "hp", "+abc", &dice, &limits).await.unwrap_err();
        assert!(matches!(err, SheetError::Dice(_)));
        assert!(err.is_user_error());
    }

    #[tokio::test]
    async fn test_delete_clears_current() {
        let (_dir, store) = store();
        store.create("42", "Alice", "hp1").await.unwrap();
        let bob = store.create("42", "Bob", "hp1").await.unwrap();

        // Deleting an inactive sheet keeps the pointer.
        store.delete("42", "Alice").await.unwrap();
        assert_eq!(store.current_id("42").await.unwrap(), Some(bob.id));

        store.delete("42", "Bob").await.unwrap();
        assert!(store.current_id("42").await.unwrap().is_none());
        assert!(store.list("42").await.unwrap().is_empty());

        let err = store.delete("42", "Bob").await.unwrap_err();
        assert!(matches!(err, SheetError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_dangling_pointer_is_none() {
        let (dir, store) = store();
        std::fs::create_dir_all(dir.path().join("42")).unwrap();
        std::fs::write(dir.path().join("42").join(CURRENT_FILE), Uuid::new_v4().to_string()).unwrap();
        assert!(store.current("42").await.unwrap().is_none());

        std::fs::write(dir.path().join("42").join(CURRENT_FILE), "../../etc/passwd").unwrap();
        assert!(store.current("42").await.unwrap().is_none());
    }
}
