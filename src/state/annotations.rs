/// Per-object side-state layered onto the read-only collection
///
/// Three keyspaces share nothing but the object ID and serialize
/// independently, so an oversized image blob in the contribution map can
/// never corrupt the documented-object set:
/// 1. the documented-object set (a JSON id array),
/// 2. the contribution map (JSON map id -> images + notes),
/// 3. the last-edit timestamp (a JSON string).
///
/// Writes go memory-first: a failed persistence attempt is reported to
/// the caller for display but the in-memory change stays. The curator
/// keeps their edit for the session and is told it may not survive a
/// restart.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DOCUMENTED_KEY: &str = "museum_documented_objects";
pub const CONTRIBUTIONS_KEY: &str = "museum_user_contributions";
pub const LAST_EDIT_KEY: &str = "museum_last_edit_time";

/// One curator-supplied image. Freshly attached images carry a local
/// data URL; images published through the remote uploader also carry a
/// public URL. Display prefers the remote URL when both exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContributionImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub filename: String,
    /// RFC 3339
    pub upload_date: String,
}

impl ContributionImage {
    /// Raw bytes of the local copy, when one is stored.
    pub fn local_bytes(&self) -> Option<Vec<u8>> {
        use base64::Engine;

        let data_url = self.data_url.as_deref()?;
        let encoded = data_url.split_once(";base64,")?.1;
        base64::engine::general_purpose::STANDARD.decode(encoded).ok()
    }
}

/// Curator-authored notes and images attached to one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contribution {
    pub images: Vec<ContributionImage>,
    pub notes: String,
    /// RFC 3339, refreshed on every write
    pub timestamp: String,
}

impl Contribution {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.notes.is_empty()
    }
}

/// Raised when an annotation write cannot be persisted. The in-memory
/// state has already been mutated and is kept.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("could not encode annotations: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not write annotations: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl PersistError {
    /// Actionable message for the status line / detail pane.
    pub fn user_message(&self) -> String {
        format!("Saving failed: {self}. Storage may be full - try removing some images.")
    }
}

/// The durable annotation layer. Owns its SQLite connection; all writes
/// are synchronous and whole-keyspace (the sets involved are small
/// enough that diffing would buy nothing).
pub struct AnnotationStore {
    conn: Connection,
    documented: HashSet<i64>,
    contributions: HashMap<i64, Contribution>,
    last_edit: Option<DateTime<Utc>>,
}

impl AnnotationStore {
    /// Open (or create) the store and load all three keyspaces. A
    /// corrupt keyspace is logged and reset without touching the others.
    pub fn open(db_path: &Path) -> rusqlite::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .expect("Failed to create application data directory");
        }

        let conn = Connection::open(db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS annotations (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;

        let documented: HashSet<i64> = read_keyspace(&conn, DOCUMENTED_KEY)?
            .map(|ids: Vec<i64>| ids.into_iter().collect())
            .unwrap_or_default();
        let contributions: HashMap<i64, Contribution> =
            read_keyspace(&conn, CONTRIBUTIONS_KEY)?.unwrap_or_default();
        let last_edit = read_keyspace(&conn, LAST_EDIT_KEY)?
            .and_then(|text: String| DateTime::parse_from_rfc3339(&text).ok())
            .map(|dt| dt.with_timezone(&Utc));

        info!(
            "annotation store ready: {} documented, {} contributions",
            documented.len(),
            contributions.len()
        );

        Ok(AnnotationStore {
            conn,
            documented,
            contributions,
            last_edit,
        })
    }

    /// The annotation database lives next to the rest of the app data:
    /// - Linux: ~/.local/share/museum-archive/annotations.db
    /// - macOS: ~/Library/Application Support/museum-archive/annotations.db
    /// - Windows: %APPDATA%\museum-archive\annotations.db
    pub fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .expect("Could not determine user data directory");

        path.push("museum-archive");
        path.push("annotations.db");
        path
    }

    // ---- documentation flags ----

    pub fn is_documented(&self, object_id: i64) -> bool {
        self.documented.contains(&object_id)
    }

    pub fn documented_count(&self) -> usize {
        self.documented.len()
    }

    /// Flip the documented flag. Returns the new state.
    pub fn toggle(&mut self, object_id: i64) -> Result<bool, PersistError> {
        let now_documented = if self.documented.remove(&object_id) {
            false
        } else {
            self.documented.insert(object_id);
            true
        };
        self.persist_documented()?;
        self.touch_last_edit()?;
        Ok(now_documented)
    }

    /// Documented count and whole-collection percentage for the progress
    /// bar.
    pub fn progress(&self, total: usize) -> (usize, u8) {
        if total == 0 {
            return (0, 0);
        }
        let count = self.documented.len();
        let percentage = ((count as f64 / total as f64) * 100.0).round() as u8;
        (count, percentage)
    }

    // ---- contributions ----

    pub fn contribution(&self, object_id: i64) -> Option<&Contribution> {
        self.contributions.get(&object_id)
    }

    /// Merge a save into the contribution for one object: new images are
    /// appended after the existing ones, notes are replaced wholesale,
    /// the timestamp is refreshed.
    pub fn upsert_contribution(
        &mut self,
        object_id: i64,
        new_images: Vec<ContributionImage>,
        notes: String,
    ) -> Result<(), PersistError> {
        let entry = self.contributions.entry(object_id).or_default();
        entry.images.extend(new_images);
        entry.notes = notes;
        entry.timestamp = Utc::now().to_rfc3339();

        self.persist_contributions()?;
        self.touch_last_edit()
    }

    /// Remove one stored image by position; refreshes the timestamp.
    /// Out-of-range indices are ignored.
    pub fn remove_image(&mut self, object_id: i64, index: usize) -> Result<(), PersistError> {
        let Some(entry) = self.contributions.get_mut(&object_id) else {
            return Ok(());
        };
        if index >= entry.images.len() {
            return Ok(());
        }
        entry.images.remove(index);
        entry.timestamp = Utc::now().to_rfc3339();

        self.persist_contributions()?;
        self.touch_last_edit()
    }

    // ---- last-edit timestamp ----

    /// Purely observational; never read by filtering logic.
    pub fn last_edit(&self) -> Option<DateTime<Utc>> {
        self.last_edit
    }

    // ---- progress export / import ----

    /// Progress snapshot for sharing or backup.
    pub fn export_progress(&self, total: usize) -> String {
        let (count, percentage) = self.progress(total);
        let mut ids: Vec<i64> = self.documented.iter().copied().collect();
        ids.sort_unstable();

        let snapshot = serde_json::json!({
            "total_objects": total,
            "documented_count": count,
            "documented_ids": ids,
            "percentage": percentage,
            "export_date": Utc::now().to_rfc3339(),
        });
        serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| "{}".into())
    }

    /// Replace the documented set from an exported snapshot. Returns the
    /// imported count.
    pub fn import_progress(&mut self, json: &str) -> Result<usize, PersistError> {
        #[derive(Deserialize)]
        struct Snapshot {
            documented_ids: Vec<i64>,
        }

        let snapshot: Snapshot = serde_json::from_str(json)?;
        self.documented = snapshot.documented_ids.into_iter().collect();
        self.persist_documented()?;
        self.touch_last_edit()?;
        Ok(self.documented.len())
    }

    /// Clear all documentation progress. Contributions are untouched.
    pub fn reset_progress(&mut self) -> Result<(), PersistError> {
        self.documented.clear();
        self.persist_documented()?;
        self.touch_last_edit()
    }

    // ---- persistence ----

    fn persist_documented(&self) -> Result<(), PersistError> {
        let mut ids: Vec<i64> = self.documented.iter().copied().collect();
        ids.sort_unstable();
        self.write_keyspace(DOCUMENTED_KEY, &ids)
    }

    fn persist_contributions(&self) -> Result<(), PersistError> {
        self.write_keyspace(CONTRIBUTIONS_KEY, &self.contributions)
    }

    fn touch_last_edit(&mut self) -> Result<(), PersistError> {
        let now = Utc::now();
        self.last_edit = Some(now);
        self.write_keyspace(LAST_EDIT_KEY, &now.to_rfc3339())
    }

    fn write_keyspace<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PersistError> {
        let encoded = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO annotations (key, value) VALUES (?1, ?2)",
            params![key, encoded],
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("documented", &self.documented.len())
            .field("contributions", &self.contributions.len())
            .field("last_edit", &self.last_edit)
            .finish()
    }
}

fn read_keyspace<T>(conn: &Connection, key: &str) -> rusqlite::Result<Option<T>>
where
    T: serde::de::DeserializeOwned,
{
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM annotations WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    let Some(raw) = raw else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            // One bad keyspace must not take down the others.
            warn!("corrupt annotation keyspace {key}, resetting it: {e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, AnnotationStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::open(&dir.path().join("annotations.db")).unwrap();
        (dir, store)
    }

    fn image(filename: &str) -> ContributionImage {
        ContributionImage {
            data_url: Some("data:image/jpeg;base64,aGVsbG8=".into()),
            url: None,
            filename: filename.into(),
            upload_date: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_toggle_round_trips() {
        let (_dir, mut store) = open_temp();

        assert!(!store.is_documented(42));
        assert!(store.toggle(42).unwrap());
        assert!(store.is_documented(42));
        assert!(!store.toggle(42).unwrap());
        assert!(!store.is_documented(42));
    }

    #[test]
    fn test_toggle_persists_id_list() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("annotations.db");

        let mut store = AnnotationStore::open(&db_path).unwrap();
        store.toggle(42).unwrap();

        // The serialized form is an explicit JSON id array.
        let conn = Connection::open(&db_path).unwrap();
        let raw: String = conn
            .query_row(
                "SELECT value FROM annotations WHERE key = ?1",
                params![DOCUMENTED_KEY],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(raw, "[42]");
        drop(store);

        let reopened = AnnotationStore::open(&db_path).unwrap();
        assert!(reopened.is_documented(42));
        assert!(reopened.last_edit().is_some());
    }

    #[test]
    fn test_upsert_replaces_notes_and_appends_images() {
        let (_dir, mut store) = open_temp();

        store
            .upsert_contribution(7, vec![image("a.jpg")], "n1".into())
            .unwrap();
        store
            .upsert_contribution(7, vec![image("b.jpg")], "n2".into())
            .unwrap();

        let contribution = store.contribution(7).unwrap();
        assert_eq!(contribution.notes, "n2");
        assert_eq!(contribution.images.len(), 2);
        assert_eq!(contribution.images[0].filename, "a.jpg");
        assert_eq!(contribution.images[1].filename, "b.jpg");
        assert!(!contribution.timestamp.is_empty());
    }

    #[test]
    fn test_upsert_notes_round_trip() {
        let (_dir, mut store) = open_temp();
        store.upsert_contribution(9, Vec::new(), "X".into()).unwrap();
        assert_eq!(store.contribution(9).unwrap().notes, "X");
    }

    #[test]
    fn test_remove_image_keeps_order() {
        let (_dir, mut store) = open_temp();
        store
            .upsert_contribution(
                7,
                vec![image("a.jpg"), image("b.jpg"), image("c.jpg")],
                String::new(),
            )
            .unwrap();

        store.remove_image(7, 1).unwrap();
        let filenames: Vec<_> = store
            .contribution(7)
            .unwrap()
            .images
            .iter()
            .map(|img| img.filename.clone())
            .collect();
        assert_eq!(filenames, vec!["a.jpg", "c.jpg"]);

        // Out of range is a no-op
        store.remove_image(7, 10).unwrap();
        store.remove_image(99, 0).unwrap();
    }

    #[test]
    fn test_contributions_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("annotations.db");

        let mut store = AnnotationStore::open(&db_path).unwrap();
        store
            .upsert_contribution(3, vec![image("find.jpg")], "seen in person".into())
            .unwrap();
        drop(store);

        let reopened = AnnotationStore::open(&db_path).unwrap();
        let contribution = reopened.contribution(3).unwrap();
        assert_eq!(contribution.notes, "seen in person");
        assert_eq!(contribution.images.len(), 1);
    }

    #[test]
    fn test_corrupt_keyspace_resets_independently() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("annotations.db");

        let mut store = AnnotationStore::open(&db_path).unwrap();
        store.toggle(1).unwrap();
        store
            .upsert_contribution(2, Vec::new(), "notes".into())
            .unwrap();
        drop(store);

        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO annotations (key, value) VALUES (?1, ?2)",
            params![CONTRIBUTIONS_KEY, "{corrupt"],
        )
        .unwrap();
        drop(conn);

        let reopened = AnnotationStore::open(&db_path).unwrap();
        // The flag set is intact even though the contribution map is gone.
        assert!(reopened.is_documented(1));
        assert!(reopened.contribution(2).is_none());
    }

    #[test]
    fn test_progress_percentage() {
        let (_dir, mut store) = open_temp();
        assert_eq!(store.progress(0), (0, 0));
        store.toggle(1).unwrap();
        store.toggle(2).unwrap();
        assert_eq!(store.progress(3), (2, 67));
    }

    #[test]
    fn test_export_import_round_trip() {
        let (_dir, mut store) = open_temp();
        store.toggle(5).unwrap();
        store.toggle(3).unwrap();

        let exported = store.export_progress(10);
        store.reset_progress().unwrap();
        assert_eq!(store.documented_count(), 0);

        let imported = store.import_progress(&exported).unwrap();
        assert_eq!(imported, 2);
        assert!(store.is_documented(3));
        assert!(store.is_documented(5));
    }

    #[test]
    fn test_import_rejects_malformed_snapshot() {
        let (_dir, mut store) = open_temp();
        assert!(store.import_progress("not json").is_err());
    }

    #[test]
    fn test_local_bytes_decodes_data_url() {
        let img = image("a.jpg");
        assert_eq!(img.local_bytes().unwrap(), b"hello");
        let remote_only = ContributionImage {
            data_url: None,
            url: Some("https://example.com/a.jpg".into()),
            filename: "a.jpg".into(),
            upload_date: String::new(),
        };
        assert!(remote_only.local_bytes().is_none());
    }
}
