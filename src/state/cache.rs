/// Dataset cache, so restarts don't re-read and re-parse the full JSON
///
/// A single well-known key in a small SQLite table in the user's cache
/// directory. Entries older than the TTL read as absent. Every failure
/// here degrades to a cache miss: callers never see an error, they see
/// "nothing cached" and a log line.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::data::MuseumObject;

const CACHE_KEY: &str = "all_objects";
/// 7 days
const CACHE_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
enum CacheError {
    #[error("cache directory error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("cache payload error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the cache database lives:
/// - Linux: ~/.cache/museum-archive/dataset_cache.db
/// - macOS: ~/Library/Caches/museum-archive/dataset_cache.db
/// - Windows: %LOCALAPPDATA%\museum-archive\dataset_cache.db
pub fn cache_db_path() -> PathBuf {
    let mut path = dirs_next::cache_dir()
        .or_else(dirs_next::home_dir)
        .expect("Could not determine cache directory");

    path.push("museum-archive");
    path.push("dataset_cache.db");
    path
}

/// Load the cached collection if present and younger than the TTL.
pub async fn load(db_path: PathBuf) -> Option<Vec<MuseumObject>> {
    let result = tokio::task::spawn_blocking(move || load_blocking(&db_path)).await;
    match result {
        Ok(Ok(objects)) => objects,
        Ok(Err(e)) => {
            warn!("failed to load from cache: {e}");
            None
        }
        Err(e) => {
            warn!("cache load task failed: {e}");
            None
        }
    }
}

/// Persist the collection under the well-known key, overwriting any
/// prior entry. Fire-and-forget: failures are logged, never raised.
pub async fn save(db_path: PathBuf, objects: Vec<MuseumObject>) {
    let result = tokio::task::spawn_blocking(move || save_blocking(&db_path, &objects)).await;
    match result {
        Ok(Ok(())) => info!("dataset cached for future visits"),
        Ok(Err(e)) => warn!("failed to cache dataset: {e}"),
        Err(e) => warn!("cache save task failed: {e}"),
    }
}

/// Remove the entry unconditionally (debugging / forced refresh).
pub async fn clear(db_path: PathBuf) {
    let result = tokio::task::spawn_blocking(move || clear_blocking(&db_path)).await;
    match result {
        Ok(Ok(())) => info!("dataset cache cleared"),
        Ok(Err(e)) => warn!("failed to clear cache: {e}"),
        Err(e) => warn!("cache clear task failed: {e}"),
    }
}

fn open_store(db_path: &Path) -> Result<Connection, CacheError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS dataset_cache (
            key         TEXT PRIMARY KEY,
            payload     TEXT NOT NULL,
            cached_at   INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(conn)
}

fn load_blocking(db_path: &Path) -> Result<Option<Vec<MuseumObject>>, CacheError> {
    let conn = open_store(db_path)?;

    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT payload, cached_at FROM dataset_cache WHERE key = ?1",
            params![CACHE_KEY],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((payload, cached_at)) = row else {
        debug!("no cached dataset");
        return Ok(None);
    };

    let age = Utc::now().timestamp() - cached_at;
    if age >= CACHE_TTL_SECS {
        // Expired entries read as a miss; they are overwritten on the
        // next save rather than deleted here.
        debug!("cached dataset expired ({age}s old)");
        return Ok(None);
    }

    let objects: Vec<MuseumObject> = serde_json::from_str(&payload)?;
    info!(
        "loaded {} objects from cache ({} minutes old)",
        objects.len(),
        age / 60
    );
    Ok(Some(objects))
}

fn save_blocking(db_path: &Path, objects: &[MuseumObject]) -> Result<(), CacheError> {
    let conn = open_store(db_path)?;
    let payload = serde_json::to_string(objects)?;
    conn.execute(
        "INSERT OR REPLACE INTO dataset_cache (key, payload, cached_at) VALUES (?1, ?2, ?3)",
        params![CACHE_KEY, payload, Utc::now().timestamp()],
    )?;
    Ok(())
}

fn clear_blocking(db_path: &Path) -> Result<(), CacheError> {
    let conn = open_store(db_path)?;
    conn.execute(
        "DELETE FROM dataset_cache WHERE key = ?1",
        params![CACHE_KEY],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_objects() -> Vec<MuseumObject> {
        vec![
            MuseumObject {
                object_id: 1,
                title: "Cylinder seal".into(),
                ..Default::default()
            },
            MuseumObject {
                object_id: 2,
                gallery_number: "404".into(),
                ..Default::default()
            },
        ]
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dataset_cache.db");

        save(db_path.clone(), sample_objects()).await;
        let loaded = load(db_path).await;
        assert_eq!(loaded, Some(sample_objects()));
    }

    #[tokio::test]
    async fn test_missing_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dataset_cache.db");
        assert_eq!(load(db_path).await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dataset_cache.db");

        let conn = open_store(&db_path).unwrap();
        let stale = Utc::now().timestamp() - CACHE_TTL_SECS - 60;
        conn.execute(
            "INSERT OR REPLACE INTO dataset_cache (key, payload, cached_at) VALUES (?1, ?2, ?3)",
            params![CACHE_KEY, serde_json::to_string(&sample_objects()).unwrap(), stale],
        )
        .unwrap();
        drop(conn);

        assert_eq!(load(db_path).await, None);
    }

    #[tokio::test]
    async fn test_corrupt_payload_degrades_to_miss() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dataset_cache.db");

        let conn = open_store(&db_path).unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO dataset_cache (key, payload, cached_at) VALUES (?1, ?2, ?3)",
            params![CACHE_KEY, "not json", Utc::now().timestamp()],
        )
        .unwrap();
        drop(conn);

        assert_eq!(load(db_path).await, None);
    }

    #[tokio::test]
    async fn test_clear_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dataset_cache.db");

        save(db_path.clone(), sample_objects()).await;
        clear(db_path.clone()).await;
        assert_eq!(load(db_path).await, None);
    }

    #[tokio::test]
    async fn test_save_overwrites_prior_entry() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dataset_cache.db");

        save(db_path.clone(), sample_objects()).await;
        let smaller = vec![sample_objects().remove(0)];
        save(db_path.clone(), smaller.clone()).await;
        assert_eq!(load(db_path).await, Some(smaller));
    }
}
