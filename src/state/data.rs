/// Shared data structures for the application state
///
/// These structs represent the catalog records that flow between
/// the dataset layer and the UI layer.

use serde::{Deserialize, Serialize};

/// One catalog entry describing a museum object.
///
/// The dataset carries ~40 optional descriptive attributes. Text fields
/// normalize to an empty string when absent or null, so the filter and
/// sort pipeline never has to distinguish missing from empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MuseumObject {
    /// Unique dataset key
    #[serde(rename = "objectID")]
    pub object_id: i64,
    /// Display key, not guaranteed unique
    #[serde(deserialize_with = "text_or_empty")]
    pub accession_number: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub title: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub object_name: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub department: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub classification: String,
    /// Human-readable date ("ca. 2600-2350 BCE")
    #[serde(deserialize_with = "text_or_empty")]
    pub object_date: String,
    /// Numeric-as-text; may arrive as a JSON number or string
    #[serde(deserialize_with = "text_or_empty")]
    pub object_begin_date: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub object_end_date: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub culture: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub period: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub dynasty: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub reign: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub medium: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub dimensions: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub description: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub object_description: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub label: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub label_text: String,
    /// Present and non-empty iff the object is on public display
    #[serde(rename = "GalleryNumber", deserialize_with = "text_or_empty")]
    pub gallery_number: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub exhibition_history: String,
    /// Bibliographic references
    #[serde(deserialize_with = "text_or_empty")]
    pub references: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub portfolio: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub credit_line: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub repository: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub link_resource: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub metadata_date: String,
    #[serde(rename = "objectURL", deserialize_with = "text_or_empty")]
    pub object_url: String,
    #[serde(rename = "objectWikidataURL", deserialize_with = "text_or_empty")]
    pub object_wikidata_url: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub geography_type: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub country: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub region: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub subregion: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub city: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub state: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub county: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub locale: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub locus: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub excavation: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub river: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub artist_display_name: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub artist_role: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub artist_display_bio: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub artist_nationality: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub artist_begin_date: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub artist_end_date: String,
    #[serde(deserialize_with = "flag_or_false")]
    pub is_highlight: bool,
    #[serde(deserialize_with = "flag_or_false")]
    pub is_timeline_work: bool,
    #[serde(deserialize_with = "flag_or_false")]
    pub is_public_domain: bool,
    #[serde(deserialize_with = "list_or_empty")]
    pub measurements: Vec<Measurement>,
    #[serde(deserialize_with = "list_or_empty")]
    pub constituents: Vec<Constituent>,
    #[serde(deserialize_with = "list_or_empty")]
    pub tags: Vec<Tag>,
}

/// One physical measurement element from the dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Measurement {
    #[serde(deserialize_with = "text_or_empty")]
    pub element_name: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub element_description: String,
    #[serde(default)]
    pub element_measurements: std::collections::BTreeMap<String, serde_json::Value>,
}

/// Maker or other associated person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constituent {
    #[serde(deserialize_with = "text_or_empty")]
    pub name: String,
    #[serde(deserialize_with = "text_or_empty")]
    pub role: String,
}

/// Subject tags appear either as bare strings or as {"term": ...} objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Term { term: String },
    Plain(String),
}

impl Tag {
    pub fn term(&self) -> &str {
        match self {
            Tag::Term { term } => term,
            Tag::Plain(term) => term,
        }
    }
}

impl MuseumObject {
    /// True iff the gallery-number field is present and non-empty.
    pub fn is_on_view(&self) -> bool {
        !self.gallery_number.is_empty()
    }

    /// True iff there are bibliographic references or exhibition history.
    pub fn has_references(&self) -> bool {
        !self.references.is_empty() || !self.exhibition_history.is_empty()
    }

    /// On view but with no published references.
    pub fn is_photographable(&self) -> bool {
        self.is_on_view() && !self.has_references()
    }

    /// Any of the four descriptive text fields is non-empty.
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
            || !self.object_description.is_empty()
            || !self.label.is_empty()
            || !self.label_text.is_empty()
    }

    /// Lenient numeric end date. Returns None when no leading integer can
    /// be extracted; callers decide whether that means "skip the filter"
    /// or "treat as 0".
    pub fn end_date(&self) -> Option<i64> {
        lenient_int(&self.object_end_date)
    }

    /// Lowercased concatenation of the searchable text fields,
    /// space-joined, absent fields skipped.
    pub fn searchable_text(&self) -> String {
        let fields = [
            &self.title,
            &self.object_name,
            &self.description,
            &self.object_description,
            &self.label,
            &self.label_text,
            &self.culture,
            &self.period,
            &self.accession_number,
            &self.dynasty,
            &self.medium,
            &self.country,
            &self.region,
            &self.classification,
        ];
        fields
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// Parse a leading integer the way JS `parseInt` does: skip leading
/// whitespace, accept an optional sign, then take digits until the first
/// non-digit. "300 BC" parses to 300; "ca. 300" parses to nothing.
pub fn lenient_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|n| sign * n)
}

/// Format a signed year for display ("-3000" -> "3000 BCE").
/// Text that carries no leading integer is shown as-is.
pub fn format_year(text: &str) -> String {
    match lenient_int(text) {
        Some(year) if year < 0 => format!("{} BCE", -year),
        Some(year) => format!("{} CE", year),
        None => text.to_string(),
    }
}

/// The museum renamed this department but the dataset still carries both
/// spellings; merge them for display only. Filtering matches the raw value.
pub fn normalize_department(name: &str) -> &str {
    match name {
        "Ancient Near Eastern Art" | "Ancient West Asian Art" => {
            "Ancient Near Eastern Art / Ancient West Asian Art"
        }
        other => other,
    }
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn flag_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_view_object() -> MuseumObject {
        MuseumObject {
            object_id: 1,
            gallery_number: "204".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_on_view_requires_gallery_number() {
        assert!(on_view_object().is_on_view());
        assert!(!MuseumObject::default().is_on_view());
    }

    #[test]
    fn test_photographable_excludes_referenced_objects() {
        let mut obj = on_view_object();
        assert!(obj.is_photographable());

        obj.references = "Smith 1990".into();
        assert!(obj.has_references());
        assert!(!obj.is_photographable());

        obj.references.clear();
        obj.exhibition_history = "Treasures of Ur, 1998".into();
        assert!(obj.has_references());
        assert!(!obj.is_photographable());
    }

    #[test]
    fn test_description_any_of_four_fields() {
        let mut obj = MuseumObject::default();
        assert!(!obj.has_description());
        obj.label_text = "Cylinder seal".into();
        assert!(obj.has_description());
    }

    #[test]
    fn test_lenient_int_matches_parse_int() {
        assert_eq!(lenient_int("-3000"), Some(-3000));
        assert_eq!(lenient_int("  300 BC"), Some(300));
        assert_eq!(lenient_int("+5"), Some(5));
        assert_eq!(lenient_int("0.9"), Some(0));
        assert_eq!(lenient_int("ca. 300"), None);
        assert_eq!(lenient_int(""), None);
    }

    #[test]
    fn test_null_and_numeric_fields_normalize() {
        let json = r#"{
            "objectID": 42,
            "accessionNumber": "74.51.4403",
            "title": null,
            "objectEndDate": -1200,
            "GalleryNumber": "171",
            "tags": [{"term": "Vessels"}, "Bronze"],
            "measurements": null
        }"#;
        let obj: MuseumObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.object_id, 42);
        assert_eq!(obj.title, "");
        assert_eq!(obj.object_end_date, "-1200");
        assert_eq!(obj.end_date(), Some(-1200));
        assert!(obj.is_on_view());
        assert_eq!(obj.tags[0].term(), "Vessels");
        assert_eq!(obj.tags[1].term(), "Bronze");
        assert!(obj.measurements.is_empty());
    }

    #[test]
    fn test_searchable_text_skips_absent_fields() {
        let obj = MuseumObject {
            title: "Standing Bull".into(),
            culture: "Sumerian".into(),
            ..Default::default()
        };
        assert_eq!(obj.searchable_text(), "standing bull sumerian");
    }

    #[test]
    fn test_format_year() {
        assert_eq!(format_year("-3000"), "3000 BCE");
        assert_eq!(format_year("500"), "500 CE");
        assert_eq!(format_year("unknown"), "unknown");
    }
}
