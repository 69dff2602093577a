//! Executes a [`QueryPlan`] over rows held in memory.
//!
//! Joins and counts index the foreign collection once per stage, so a view
//! costs one pass over each collection it touches.

use std::collections::HashMap;
use serde_json::Value;
use crate::constants::ID_FIELD;
use crate::types::Collection;
use crate::view::path::{assign, compare, join_key, lookup, project};
use crate::view::{CountJoin, JoinShape, Lookup, QueryPlan, SortDirection, SortSpec, Stage};

/// Something that can list every row of a collection
pub trait RowSource {
    /// All rows of a collection, in no particular order
    fn scan(&self, collection: Collection) -> Vec<Value>;
}

/// Run a plan to completion
pub fn execute(plan: &QueryPlan, source: &dyn RowSource) -> Vec<Value> {
    let mut rows = source.scan(plan.source);

    for stage in &plan.stages {
        rows = match stage {
            Stage::Match(filter) => rows.into_iter().filter(|row| filter.matches(row)).collect(),
            Stage::Lookup(spec) => apply_lookup(rows, spec, source),
            Stage::Count(spec) => apply_count(rows, spec, source),
            Stage::Sort(spec) => {
                sort_rows(&mut rows, spec);
                rows
            }
            Stage::Skip(n) => rows.into_iter().skip(to_usize(*n)).collect(),
            Stage::Limit(n) => rows.into_iter().take(to_usize(*n)).collect(),
        };
    }

    rows
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn apply_lookup(rows: Vec<Value>, spec: &Lookup, source: &dyn RowSource) -> Vec<Value> {
    let mut index: HashMap<String, Vec<Value>> = HashMap::new();
    for foreign in source.scan(spec.from) {
        if let Some(key) = lookup(&foreign, &spec.foreign_field).and_then(join_key) {
            let shaped = match &spec.project {
                Some(fields) => project(&foreign, fields),
                None => foreign,
            };
            index.entry(key).or_default().push(shaped);
        }
    }

    let first = |key: Option<String>| -> Option<Value> {
        key.and_then(|k| index.get(&k)).and_then(|matches| matches.first().cloned())
    };

    rows.into_iter()
        .filter_map(|mut row| {
            let local = lookup(&row, &spec.local_field).cloned();
            let joined = match (spec.shape, local) {
                (JoinShape::One, local) => first(local.as_ref().and_then(join_key)).unwrap_or(Value::Null),
                (JoinShape::Many, Some(Value::Array(keys))) => {
                    Value::Array(keys.iter().filter_map(|k| first(join_key(k))).collect())
                }
                (JoinShape::Many, local) => Value::Array(
                    local
                        .as_ref()
                        .and_then(join_key)
                        .and_then(|k| index.get(&k).cloned())
                        .unwrap_or_default(),
                ),
            };

            let missing = match &joined {
                Value::Null => true,
                Value::Array(items) => items.is_empty(),
                _ => false,
            };
            if spec.required && missing {
                return None;
            }

            assign(&mut row, &spec.as_field, joined);
            Some(row)
        })
        .collect()
}

fn apply_count(rows: Vec<Value>, spec: &CountJoin, source: &dyn RowSource) -> Vec<Value> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for foreign in source.scan(spec.from) {
        if !spec.filter.matches(&foreign) {
            continue;
        }
        if let Some(key) = lookup(&foreign, &spec.foreign_field).and_then(join_key) {
            *counts.entry(key).or_default() += 1;
        }
    }

    rows.into_iter()
        .map(|mut row| {
            let count = lookup(&row, &spec.local_field)
                .and_then(join_key)
                .and_then(|key| counts.get(&key).copied())
                .unwrap_or(0);
            assign(&mut row, &spec.as_field, Value::from(count));
            row
        })
        .collect()
}

/// Sort by the spec's field, breaking ties by `_id` ascending
pub fn sort_rows(rows: &mut [Value], spec: &SortSpec) {
    rows.sort_by(|a, b| {
        let primary = compare(lookup(a, &spec.field), lookup(b, &spec.field));
        let primary = match spec.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| compare(a.get(ID_FIELD), b.get(ID_FIELD)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{CountJoin, Filter, Lookup, Page, ViewQuery};
    use serde_json::json;

    struct Fixture(HashMap<Collection, Vec<Value>>);

    impl RowSource for Fixture {
        fn scan(&self, collection: Collection) -> Vec<Value> {
            self.0.get(&collection).cloned().unwrap_or_default()
        }
    }

    fn fixture() -> Fixture {
        let mut data = HashMap::new();
        data.insert(
            Collection::Users,
            vec![json!({"_id": "u1", "username": "ana", "fullname": "Ana", "avatar": "a", "secret": "x"})],
        );
        data.insert(
            Collection::Videos,
            vec![
                json!({"_id": "v1", "owner": "u1", "title": "First", "createdAt": 10}),
                json!({"_id": "v2", "owner": "u1", "title": "Second", "createdAt": 20}),
                json!({"_id": "v3", "owner": "gone", "title": "Orphan", "createdAt": 20}),
            ],
        );
        data.insert(
            Collection::Likes,
            vec![
                json!({"_id": "l1", "actor": "u1", "target": {"type": "video", "id": "v1"}, "createdAt": 1}),
                json!({"_id": "l2", "actor": "u2", "target": {"type": "video", "id": "v1"}, "createdAt": 2}),
                json!({"_id": "l3", "actor": "u2", "target": {"type": "comment", "id": "v1"}, "createdAt": 3}),
                json!({"_id": "l4", "actor": "u1", "target": {"type": "video", "id": "missing"}, "createdAt": 4}),
            ],
        );
        data.insert(
            Collection::Playlists,
            vec![json!({"_id": "p1", "videos": ["v2", "missing", "v1"]})],
        );
        Fixture(data)
    }

    #[test]
    fn test_owner_join_projects_profile_and_tolerates_missing_owner() {
        let plan = ViewQuery::from(Collection::Videos)
            .join(Lookup::profile("owner", "owner"))
            .build();
        let rows = execute(&plan, &fixture());

        let v1 = rows.iter().find(|r| r["_id"] == "v1").unwrap();
        assert_eq!(v1["owner"], json!({"_id": "u1", "username": "ana", "fullname": "Ana", "avatar": "a"}));

        let orphan = rows.iter().find(|r| r["_id"] == "v3").unwrap();
        assert_eq!(orphan["owner"], Value::Null);
    }

    #[test]
    fn test_like_count_only_counts_matching_target_type() {
        let plan = ViewQuery::from(Collection::Videos)
            .count(CountJoin::likes("video", "likesCount"))
            .build();
        let rows = execute(&plan, &fixture());

        let count = |id: &str| rows.iter().find(|r| r["_id"] == id).unwrap()["likesCount"].clone();
        assert_eq!(count("v1"), 2);
        assert_eq!(count("v2"), 0);
    }

    #[test]
    fn test_sort_desc_breaks_ties_by_id() {
        let plan = ViewQuery::from(Collection::Videos).build();
        let ids: Vec<_> = execute(&plan, &fixture()).iter().map(|r| r["_id"].clone()).collect();
        assert_eq!(ids, vec![json!("v2"), json!("v3"), json!("v1")]);
    }

    #[test]
    fn test_page_applies_skip_and_limit() {
        let plan = ViewQuery::from(Collection::Videos).page(Page::new(2, 2)).build();
        let rows = execute(&plan, &fixture());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["_id"], "v1");
    }

    #[test]
    fn test_many_join_keeps_array_order_and_skips_missing() {
        let plan = ViewQuery::from(Collection::Playlists)
            .join(Lookup::many(Collection::Videos, "videos", "videos").project(&["_id", "title"]))
            .build();
        let rows = execute(&plan, &fixture());
        assert_eq!(rows[0]["videos"], json!([{"_id": "v2", "title": "Second"}, {"_id": "v1", "title": "First"}]));
    }

    #[test]
    fn test_required_join_drops_dangling_rows() {
        let plan = ViewQuery::from(Collection::Likes)
            .filter(Filter::eq("actor", "u1"))
            .join(Lookup::one(Collection::Videos, "target.id", "video").required())
            .build();
        let rows = execute(&plan, &fixture());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["video"]["_id"], "v1");
    }
}
