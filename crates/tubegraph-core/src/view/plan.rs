//! Query plans: an ordered list of stage descriptors executed once by the store.

use serde::{Deserialize, Serialize};
use crate::constants::{CREATED_AT_FIELD, ID_FIELD, PROFILE_FIELDS};
use crate::types::{Collection, Error, Result};
use crate::view::filter::Filter;

/// How many related rows a lookup attaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinShape {
    /// The first matching row, or null
    One,
    /// Every matching row as an array. When the local field is an array of
    /// keys the result keeps the order of that array.
    Many,
}

/// Attach related rows from another collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lookup {
    /// Collection joined
    pub from: Collection,
    /// Field on the current row holding the key (or array of keys)
    pub local_field: String,
    /// Field on the joined rows compared with the key
    pub foreign_field: String,
    /// Field the result is written to
    pub as_field: String,
    /// Top-level fields kept on the joined rows; `None` keeps everything
    pub project: Option<Vec<String>>,
    /// Single row or array
    pub shape: JoinShape,
    /// Drop rows whose one-to-one join found nothing (inner join)
    pub required: bool,
}

impl Lookup {
    /// One-to-one join on `local_field == from._id`
    pub fn one(from: Collection, local_field: &str, as_field: &str) -> Self {
        Self {
            from,
            local_field: local_field.to_string(),
            foreign_field: ID_FIELD.to_string(),
            as_field: as_field.to_string(),
            project: None,
            shape: JoinShape::One,
            required: false,
        }
    }

    /// Join the array of ids held in `local_field` to rows of `from`
    pub fn many(from: Collection, local_field: &str, as_field: &str) -> Self {
        Self { shape: JoinShape::Many, ..Self::one(from, local_field, as_field) }
    }

    /// Owner profile projected to the public profile fields
    pub fn profile(local_field: &str, as_field: &str) -> Self {
        Self::one(Collection::Users, local_field, as_field).project(PROFILE_FIELDS)
    }

    /// Keep only these fields of the joined rows
    pub fn project(mut self, fields: &[&str]) -> Self {
        self.project = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Drop rows whose join found nothing
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Computed field: number of rows in `from` whose `foreign_field` equals this row's `local_field`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountJoin {
    /// Collection counted
    pub from: Collection,
    /// Field on this row holding the key
    pub local_field: String,
    /// Field on the counted rows compared with the key
    pub foreign_field: String,
    /// Extra predicate on the counted rows
    pub filter: Filter,
    /// Field the count is written to
    pub as_field: String,
}

impl CountJoin {
    /// Count rows of `from` whose `foreign_field` equals this row's `_id`
    pub fn new(from: Collection, foreign_field: &str, as_field: &str) -> Self {
        Self {
            from,
            local_field: ID_FIELD.to_string(),
            foreign_field: foreign_field.to_string(),
            filter: Filter::All,
            as_field: as_field.to_string(),
        }
    }

    /// Number of like edges targeting this row, for targets of `target_type`
    pub fn likes(target_type: &str, as_field: &str) -> Self {
        Self::new(Collection::Likes, "target.id", as_field)
            .filtered(Filter::eq("target.type", target_type))
    }

    /// Use a different key field on the current row
    pub fn keyed_by(mut self, local_field: &str) -> Self {
        self.local_field = local_field.to_string();
        self
    }

    /// Only count rows matching the predicate
    pub fn filtered(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first
    Asc,
    /// Largest first
    Desc,
}

/// Sort order of a view. Ties are always broken by `_id` ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field sorted on
    pub field: String,
    /// Direction
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::desc(CREATED_AT_FIELD)
    }
}

impl SortSpec {
    /// Ascending on a field
    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), direction: SortDirection::Asc }
    }

    /// Descending on a field
    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), direction: SortDirection::Desc }
    }

    /// Parse caller input against the fields a view allows sorting on.
    ///
    /// No field means the default (`createdAt` descending). `"asc"` selects
    /// ascending; anything else is descending.
    pub fn from_raw(sort_by: Option<&str>, sort_type: Option<&str>, allowed: &[&str]) -> Result<Self> {
        let field = match sort_by.map(str::trim).filter(|s| !s.is_empty()) {
            None => return Ok(Self::default()),
            Some(field) => field,
        };
        if !allowed.contains(&field) {
            return Err(Error::invalid_argument(format!(
                "cannot sort by '{field}', expected one of: {}",
                allowed.join(", ")
            )));
        }

        let direction = match sort_type.map(|s| s.trim().to_ascii_lowercase()) {
            Some(ref s) if s == "asc" => SortDirection::Asc,
            _ => SortDirection::Desc,
        };
        Ok(Self { field: field.to_string(), direction })
    }
}

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    /// Keep rows matching the predicate
    Match(Filter),
    /// Attach related rows
    Lookup(Lookup),
    /// Attach a computed count
    Count(CountJoin),
    /// Order rows
    Sort(SortSpec),
    /// Drop the first n rows
    Skip(u64),
    /// Keep at most n rows
    Limit(u64),
}

/// Executable description of a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Collection rows are read from
    pub source: Collection,
    /// Stages in execution order
    pub stages: Vec<Stage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SORTABLE: &[&str] = &["createdAt", "views", "title"];

    #[test]
    fn test_sort_defaults_to_newest_first() {
        assert_eq!(SortSpec::from_raw(None, Some("asc"), SORTABLE).unwrap(), SortSpec::desc("createdAt"));
        assert_eq!(SortSpec::from_raw(Some("  "), None, SORTABLE).unwrap(), SortSpec::desc("createdAt"));
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!(SortSpec::from_raw(Some("views"), Some("ASC"), SORTABLE).unwrap(), SortSpec::asc("views"));
        assert_eq!(SortSpec::from_raw(Some("views"), Some("up"), SORTABLE).unwrap(), SortSpec::desc("views"));
        assert_eq!(SortSpec::from_raw(Some("title"), None, SORTABLE).unwrap(), SortSpec::desc("title"));
    }

    #[test]
    fn test_unknown_sort_field_is_invalid() {
        let err = SortSpec::from_raw(Some("owner.password"), None, SORTABLE).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_profile_lookup_projects_public_fields() {
        let lookup = Lookup::profile("owner", "owner");
        assert_eq!(lookup.from, Collection::Users);
        assert_eq!(lookup.foreign_field, "_id");
        assert_eq!(lookup.project.as_deref().map(<[String]>::len), Some(4));
    }
}
