/// Filter, search and sort pipeline over the loaded collection
///
/// Everything in this module is a pure function over `&[MuseumObject]`:
/// the source collection is never reordered, results are index sequences
/// into it. The shell recomputes on every criteria change.

use std::cmp::Ordering;

use super::data::MuseumObject;

/// Coarse chronological buckets over the lenient numeric end date.
/// Bounds are closed on both sides, matching the source data conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    /// end date < -3000
    Prehistoric,
    /// -3000 ..= -1200
    Bronze,
    /// -1200 ..= -500
    Iron,
    /// -500 ..= 0
    Classical,
    /// 0 ..= 500
    Early,
}

impl DateBucket {
    pub const ALL: [DateBucket; 5] = [
        DateBucket::Prehistoric,
        DateBucket::Bronze,
        DateBucket::Iron,
        DateBucket::Classical,
        DateBucket::Early,
    ];

    /// Whether a parsed end date falls inside this bucket. A record whose
    /// end date does not parse is never tested against a bucket at all.
    fn contains(self, end_date: i64) -> bool {
        match self {
            DateBucket::Prehistoric => end_date < -3000,
            DateBucket::Bronze => (-3000..=-1200).contains(&end_date),
            DateBucket::Iron => (-1200..=-500).contains(&end_date),
            DateBucket::Classical => (-500..=0).contains(&end_date),
            DateBucket::Early => (0..=500).contains(&end_date),
        }
    }
}

impl std::fmt::Display for DateBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DateBucket::Prehistoric => "Prehistoric (before 3000 BCE)",
            DateBucket::Bronze => "Bronze Age (3000-1200 BCE)",
            DateBucket::Iron => "Iron Age (1200-500 BCE)",
            DateBucket::Classical => "Classical (500 BCE-0 CE)",
            DateBucket::Early => "Early CE (0-500 CE)",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryStatus {
    OnView,
    InStorage,
}

impl GalleryStatus {
    pub const ALL: [GalleryStatus; 2] = [GalleryStatus::OnView, GalleryStatus::InStorage];
}

impl std::fmt::Display for GalleryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            GalleryStatus::OnView => "On View",
            GalleryStatus::InStorage => "In Storage",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceStatus {
    HasReferences,
    NoReferences,
    Photographable,
}

impl ReferenceStatus {
    pub const ALL: [ReferenceStatus; 3] = [
        ReferenceStatus::HasReferences,
        ReferenceStatus::NoReferences,
        ReferenceStatus::Photographable,
    ];
}

impl std::fmt::Display for ReferenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReferenceStatus::HasReferences => "Has References",
            ReferenceStatus::NoReferences => "No References",
            ReferenceStatus::Photographable => "Photographable",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionStatus {
    HasDescription,
    NoDescription,
}

impl DescriptionStatus {
    pub const ALL: [DescriptionStatus; 2] = [
        DescriptionStatus::HasDescription,
        DescriptionStatus::NoDescription,
    ];
}

impl std::fmt::Display for DescriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DescriptionStatus::HasDescription => "Has Description",
            DescriptionStatus::NoDescription => "No Description",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Accession,
    DateOldest,
    DateRecent,
    Culture,
    Department,
    Gallery,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Accession,
        SortKey::DateOldest,
        SortKey::DateRecent,
        SortKey::Culture,
        SortKey::Department,
        SortKey::Gallery,
    ];
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SortKey::Accession => "Accession Number",
            SortKey::DateOldest => "Date (Oldest First)",
            SortKey::DateRecent => "Date (Most Recent First)",
            SortKey::Culture => "Culture",
            SortKey::Department => "Department",
            SortKey::Gallery => "Gallery Number",
        })
    }
}

/// The full set of active filter/sort selections at one moment.
/// Every field defaults to "no constraint"; `sort: None` leaves the
/// filtered sequence in collection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub search: String,
    /// Exact department match; empty means any
    pub department: String,
    pub date_bucket: Option<DateBucket>,
    pub gallery_status: Option<GalleryStatus>,
    pub reference_status: Option<ReferenceStatus>,
    pub description_status: Option<DescriptionStatus>,
    pub sort: Option<SortKey>,
}

/// Apply all active constraints and the sort key; returns indices into
/// `objects` in result order. Never fails: absent fields read as empty,
/// unparseable end dates skip the date constraint.
pub fn filter_and_sort(objects: &[MuseumObject], criteria: &FilterCriteria) -> Vec<usize> {
    let needle = criteria.search.to_lowercase();

    let mut indices: Vec<usize> = objects
        .iter()
        .enumerate()
        .filter(|(_, obj)| matches(obj, criteria, &needle))
        .map(|(i, _)| i)
        .collect();

    if let Some(key) = criteria.sort {
        // Vec::sort_by is stable, so ties keep collection order.
        indices.sort_by(|&a, &b| compare(&objects[a], &objects[b], key));
    }

    indices
}

fn matches(obj: &MuseumObject, criteria: &FilterCriteria, needle: &str) -> bool {
    if !needle.is_empty() && !obj.searchable_text().contains(needle) {
        return false;
    }

    if !criteria.department.is_empty() && obj.department != criteria.department {
        return false;
    }

    if let Some(bucket) = criteria.date_bucket {
        // Records without a parseable end date pass every bucket.
        if let Some(end_date) = obj.end_date() {
            if !bucket.contains(end_date) {
                return false;
            }
        }
    }

    if let Some(status) = criteria.gallery_status {
        let wanted = matches!(status, GalleryStatus::OnView);
        if obj.is_on_view() != wanted {
            return false;
        }
    }

    if let Some(status) = criteria.reference_status {
        let pass = match status {
            ReferenceStatus::HasReferences => obj.has_references(),
            ReferenceStatus::NoReferences => !obj.has_references(),
            ReferenceStatus::Photographable => obj.is_photographable(),
        };
        if !pass {
            return false;
        }
    }

    if let Some(status) = criteria.description_status {
        let wanted = matches!(status, DescriptionStatus::HasDescription);
        if obj.has_description() != wanted {
            return false;
        }
    }

    true
}

fn compare(a: &MuseumObject, b: &MuseumObject, key: SortKey) -> Ordering {
    match key {
        SortKey::Accession => a.accession_number.cmp(&b.accession_number),
        SortKey::DateOldest => sort_date(a).cmp(&sort_date(b)),
        SortKey::DateRecent => sort_date(b).cmp(&sort_date(a)),
        SortKey::Culture => a.culture.cmp(&b.culture),
        SortKey::Department => a.department.cmp(&b.department),
        SortKey::Gallery => match (a.is_on_view(), b.is_on_view()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.gallery_number.cmp(&b.gallery_number),
        },
    }
}

/// Unparseable end dates sort as 0 (not filtered out, just ordered there).
fn sort_date(obj: &MuseumObject) -> i64 {
    obj.end_date().unwrap_or(0)
}

/// Unique departments present in the collection, sorted, for the filter
/// dropdown.
pub fn department_options(objects: &[MuseumObject]) -> Vec<String> {
    let mut departments: Vec<String> = objects
        .iter()
        .filter(|obj| !obj.department.is_empty())
        .map(|obj| obj.department.clone())
        .collect();
    departments.sort();
    departments.dedup();
    departments
}

/// Predicate tallies over the current filtered set, shown under the
/// result count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub on_view: usize,
    pub in_storage: usize,
    pub has_references: usize,
    pub no_references: usize,
    pub photographable: usize,
    pub has_description: usize,
    pub no_description: usize,
}

impl StatusBreakdown {
    pub fn tally(objects: &[MuseumObject], indices: &[usize]) -> Self {
        let mut breakdown = StatusBreakdown::default();
        for &i in indices {
            let obj = &objects[i];
            if obj.is_on_view() {
                breakdown.on_view += 1;
            } else {
                breakdown.in_storage += 1;
            }
            if obj.has_references() {
                breakdown.has_references += 1;
            } else {
                breakdown.no_references += 1;
            }
            if obj.is_photographable() {
                breakdown.photographable += 1;
            }
            if obj.has_description() {
                breakdown.has_description += 1;
            } else {
                breakdown.no_description += 1;
            }
        }
        breakdown
    }
}
