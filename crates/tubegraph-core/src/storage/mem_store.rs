//! In-memory entity store using DashMap
//!
//! Entity rows are JSON objects in one DashMap per collection. Edges live in a
//! single DashMap keyed by their uniqueness key, so the toggle is a single
//! shard-locked entry operation: two concurrent toggles on the same key
//! serialize on the shard lock and can never both insert or both remove.

use std::collections::HashMap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use crate::constants::ID_FIELD;
use crate::storage::pipeline::{execute, RowSource};
use crate::storage::{EntityStore, Patch, PatchOutcome, StoreResult};
use crate::system::metrics::{Metrics, Timer};
use crate::types::{Collection, Edge, EdgeKey, EdgeKind, StoreError, ToggleOutcome, ID16};
use crate::view::{Filter, QueryPlan};

/// Serializable copy of a [`MemStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Entity rows per collection
    pub rows: Vec<(Collection, Vec<Value>)>,
    /// Every edge
    pub edges: Vec<Edge>,
}

/// DashMap-backed [`EntityStore`]
pub struct MemStore {
    /// One table per entity collection
    tables: HashMap<Collection, DashMap<ID16, Value>>,

    /// Edges indexed by (actor, target, kind)
    edges: DashMap<EdgeKey, Edge>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            tables: Collection::ENTITIES.iter().map(|c| (*c, DashMap::new())).collect(),
            edges: DashMap::new(),
        }
    }

    /// Rebuild a store from a snapshot
    pub fn restore(snapshot: StoreSnapshot) -> StoreResult<Self> {
        let store = Self::new();
        for (collection, rows) in snapshot.rows {
            for row in rows {
                store.insert(collection, row)?;
            }
        }
        for edge in snapshot.edges {
            store.edges.insert(edge.key(), edge);
        }
        Ok(store)
    }

    /// Copy the full contents
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut rows: Vec<(Collection, Vec<Value>)> = self
            .tables
            .iter()
            .map(|(collection, table)| (*collection, table.iter().map(|r| r.value().clone()).collect()))
            .collect();
        rows.sort_by_key(|(collection, _)| *collection);

        StoreSnapshot {
            rows,
            edges: self.edges.iter().map(|e| e.value().clone()).collect(),
        }
    }

    /// Number of rows in a collection
    pub fn len(&self, collection: Collection) -> usize {
        match collection.edge_kind() {
            Some(kind) => self.edges.iter().filter(|e| e.kind == kind).count(),
            None => self.tables.get(&collection).map(DashMap::len).unwrap_or(0),
        }
    }

    /// Whether the store holds no rows and no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.tables.values().all(DashMap::is_empty)
    }

    fn table(&self, collection: Collection) -> StoreResult<&DashMap<ID16, Value>> {
        self.tables.get(&collection).ok_or_else(|| {
            StoreError::Corruption(format!("{collection} rows can only be changed through toggles"))
        })
    }

    fn edge_rows(&self, kind: EdgeKind) -> Vec<Value> {
        self.edges
            .iter()
            .filter(|e| e.kind == kind)
            .filter_map(|e| serde_json::to_value(e.value()).ok())
            .collect()
    }

    fn edge_matches(edge: &Edge, kind: EdgeKind, filter: &Filter) -> bool {
        edge.kind == kind && serde_json::to_value(edge).is_ok_and(|row| filter.matches(&row))
    }
}

fn row_id(row: &Value) -> StoreResult<ID16> {
    row.get(ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::Corruption(format!("row is missing a valid {ID_FIELD}")))
}

impl RowSource for MemStore {
    fn scan(&self, collection: Collection) -> Vec<Value> {
        match collection.edge_kind() {
            Some(kind) => self.edge_rows(kind),
            None => self
                .tables
                .get(&collection)
                .map(|table| table.iter().map(|r| r.value().clone()).collect())
                .unwrap_or_default(),
        }
    }
}

impl EntityStore for MemStore {
    fn insert(&self, collection: Collection, row: Value) -> StoreResult<()> {
        let id = row_id(&row)?;
        match self.table(collection)?.entry(id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("{} {id} already exists", collection.noun()))),
            Entry::Vacant(slot) => {
                slot.insert(row);
                Ok(())
            }
        }
    }

    fn get(&self, collection: Collection, id: &ID16) -> StoreResult<Option<Value>> {
        match collection.edge_kind() {
            Some(kind) => Ok(self
                .edges
                .iter()
                .find(|e| e.kind == kind && e.id == *id)
                .and_then(|e| serde_json::to_value(e.value()).ok())),
            None => Ok(self.table(collection)?.get(id).map(|r| r.value().clone())),
        }
    }

    fn update(&self, collection: Collection, id: &ID16, patch: &Patch) -> StoreResult<Option<PatchOutcome>> {
        let Some(mut row) = self.table(collection)?.get_mut(id) else {
            return Ok(None);
        };

        // Apply to a copy so a failing op leaves the row untouched
        let mut patched = row.value().clone();
        let applied = patch.apply(&mut patched)?;
        *row = patched.clone();

        Ok(Some(PatchOutcome { row: patched, applied }))
    }

    fn delete(&self, collection: Collection, id: &ID16) -> StoreResult<Option<Value>> {
        match collection.edge_kind() {
            Some(kind) => {
                let key = self.edges.iter().find(|e| e.kind == kind && e.id == *id).map(|e| *e.key());
                Ok(key
                    .and_then(|key| self.edges.remove(&key))
                    .and_then(|(_, edge)| serde_json::to_value(edge).ok()))
            }
            None => Ok(self.table(collection)?.remove(id).map(|(_, row)| row)),
        }
    }

    fn query(&self, plan: &QueryPlan) -> StoreResult<Vec<Value>> {
        let metrics = Metrics::global();
        metrics.views.queries.inc();
        let timer = Timer::start(metrics.views.query_duration.clone());

        let rows = execute(plan, self);

        timer.finish();
        debug!(source = %plan.source, stages = plan.stages.len(), rows = rows.len(), "view executed");
        Ok(rows)
    }

    fn count(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        let count = match collection.edge_kind() {
            Some(kind) => self.edges.iter().filter(|e| Self::edge_matches(e.value(), kind, filter)).count(),
            None => self.table(collection)?.iter().filter(|r| filter.matches(r.value())).count(),
        };
        Ok(count as u64)
    }

    fn delete_many(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>> {
        let mut removed = Vec::new();
        match collection.edge_kind() {
            Some(kind) => self.edges.retain(|_, edge| {
                if !Self::edge_matches(edge, kind, filter) {
                    return true;
                }
                if let Ok(row) = serde_json::to_value(&*edge) {
                    removed.push(row);
                }
                false
            }),
            None => self.table(collection)?.retain(|_, row| {
                if !filter.matches(row) {
                    return true;
                }
                removed.push(row.clone());
                false
            }),
        }
        Ok(removed)
    }

    fn update_many(&self, collection: Collection, filter: &Filter, patch: &Patch) -> StoreResult<u64> {
        let mut changed = 0u64;
        for mut row in self.table(collection)?.iter_mut() {
            if !filter.matches(row.value()) {
                continue;
            }
            let mut patched = row.value().clone();
            if patch.apply(&mut patched)?.into_iter().any(|applied| applied) {
                *row = patched;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn toggle_edge(&self, edge: Edge) -> StoreResult<ToggleOutcome> {
        if edge.kind != edge.target.edge_kind() {
            return Err(StoreError::Conflict(format!(
                "{:?} edge cannot target a {}",
                edge.kind,
                edge.target.type_name()
            )));
        }

        let edge_now_exists = match self.edges.entry(edge.key()) {
            Entry::Occupied(existing) => {
                existing.remove();
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(edge);
                true
            }
        };
        Ok(ToggleOutcome { edge_now_exists })
    }
}
