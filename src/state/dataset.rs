/// Dataset loading: cache first, then the static JSON file
///
/// The collection is loaded wholesale exactly once at startup. The two
/// async steps (cache lookup, file read + parse) run sequentially, never
/// concurrently. Any failure surfaces as a `DatasetError` and the shell
/// falls back to the manual file-picker affordance.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::cache;
use super::data::MuseumObject;

/// Well-known dataset filename, looked up in the app data directory and
/// then beside the current working directory.
pub const DATASET_FILE: &str = "all_unpictured_ancient_objects.json";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("could not read dataset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The file is either a bare array of records or an object wrapping the
/// array under "objects"; both are accepted transparently.
#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetFile {
    Bare(Vec<MuseumObject>),
    Wrapped { objects: Vec<MuseumObject> },
}

pub fn parse_dataset(text: &str) -> Result<Vec<MuseumObject>, serde_json::Error> {
    let parsed: DatasetFile = serde_json::from_str(text)?;
    Ok(match parsed {
        DatasetFile::Bare(objects) => objects,
        DatasetFile::Wrapped { objects } => objects,
    })
}

/// Where to look for the dataset file. Prefers the app data directory,
/// falls back to the working directory if the file is present there.
pub fn dataset_path() -> PathBuf {
    let data_dir_copy = dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|mut dir| {
            dir.push("museum-archive");
            dir.push(DATASET_FILE);
            dir
        });

    if let Some(path) = &data_dir_copy {
        if path.exists() {
            return path.clone();
        }
    }

    let local = PathBuf::from(DATASET_FILE);
    if local.exists() {
        return local;
    }

    data_dir_copy.unwrap_or(local)
}

/// Load the collection: cache lookup, then conditional file read, then
/// cache fill for the next visit.
pub async fn load(cache_db: PathBuf, dataset_file: PathBuf) -> Result<Vec<MuseumObject>, DatasetError> {
    debug!("checking dataset cache");
    if let Some(objects) = cache::load(cache_db.clone()).await {
        return Ok(objects);
    }

    info!("no cached dataset, reading {}", dataset_file.display());
    let text = tokio::fs::read_to_string(&dataset_file).await?;
    let objects = parse_dataset(&text)?;
    info!("loaded {} objects", objects.len());

    cache::save(cache_db, objects.clone()).await;
    Ok(objects)
}

/// Presence statistics for the fields the scraper is expected to
/// capture; logged after load as a data-quality check.
pub fn report_completeness(objects: &[MuseumObject]) {
    if objects.is_empty() {
        return;
    }

    let expected: [(&str, fn(&MuseumObject) -> bool); 16] = [
        ("objectID", |o| o.object_id != 0),
        ("accessionNumber", |o| !o.accession_number.is_empty()),
        ("title", |o| !o.title.is_empty()),
        ("department", |o| !o.department.is_empty()),
        ("objectDate", |o| !o.object_date.is_empty()),
        ("culture", |o| !o.culture.is_empty()),
        ("period", |o| !o.period.is_empty()),
        ("medium", |o| !o.medium.is_empty()),
        ("dimensions", |o| !o.dimensions.is_empty()),
        ("objectURL", |o| !o.object_url.is_empty()),
        ("creditLine", |o| !o.credit_line.is_empty()),
        ("linkResource", |o| !o.link_resource.is_empty()),
        ("objectWikidataURL", |o| !o.object_wikidata_url.is_empty()),
        ("GalleryNumber", |o| !o.gallery_number.is_empty()),
        ("exhibitionHistory", |o| !o.exhibition_history.is_empty()),
        ("references", |o| !o.references.is_empty()),
    ];

    for (field, present) in expected {
        let count = objects.iter().filter(|o| present(o)).count();
        let percent = (count as f64 / objects.len() as f64) * 100.0;
        debug!("{field}: {percent:.1}% present ({count}/{})", objects.len());
        if count == 0 {
            warn!("field {field} is missing from the entire dataset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"[
        {"objectID": 1, "title": "Kudurru"},
        {"objectID": 2, "GalleryNumber": "402"}
    ]"#;

    #[test]
    fn test_parse_bare_array() {
        let objects = parse_dataset(BARE).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].title, "Kudurru");
        assert!(objects[1].is_on_view());
    }

    #[test]
    fn test_parse_wrapped_object() {
        let wrapped = format!(r#"{{"objects": {BARE}}}"#);
        let objects = parse_dataset(&wrapped).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].object_id, 2);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(parse_dataset("{\"wrong\": true}").is_err());
        assert!(parse_dataset("not json at all").is_err());
    }

    #[tokio::test]
    async fn test_load_reads_file_and_fills_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache_db = dir.path().join("dataset_cache.db");
        let dataset_file = dir.path().join(DATASET_FILE);
        std::fs::write(&dataset_file, BARE).unwrap();

        let objects = load(cache_db.clone(), dataset_file.clone()).await.unwrap();
        assert_eq!(objects.len(), 2);

        // Second load comes from the cache even without the file.
        std::fs::remove_file(&dataset_file).unwrap();
        let cached = load(cache_db, dataset_file).await.unwrap();
        assert_eq!(cached, objects);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache_db = dir.path().join("dataset_cache.db");
        let missing = dir.path().join("nope.json");

        let result = load(cache_db, missing).await;
        assert!(matches!(result, Err(DatasetError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache_db = dir.path().join("dataset_cache.db");
        let dataset_file = dir.path().join(DATASET_FILE);
        std::fs::write(&dataset_file, "{{{{").unwrap();

        let result = load(cache_db, dataset_file).await;
        assert!(matches!(result, Err(DatasetError::Parse(_))));
    }
}
