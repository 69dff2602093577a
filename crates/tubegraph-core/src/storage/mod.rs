//! Storage layer for tubegraph
//!
//! This module provides the entity store abstraction. Rows are JSON documents
//! keyed by `_id`; edges live behind a uniqueness constraint on
//! (actor, target, kind) and are only ever changed through
//! [`EntityStore::toggle_edge`].

use serde_json::Value;
use crate::types::{Collection, Edge, Record, Result, StoreError, ToggleOutcome, ID16};
use crate::view::{Filter, QueryPlan};

/// Result type of raw store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One mutation applied to a stored row
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    /// Overwrite a field
    Set(String, Value),
    /// Add to a numeric field
    Increment(String, i64),
    /// Flip a boolean field
    Toggle(String),
    /// Append to an array field unless already present
    AddToSet(String, Value),
    /// Remove every occurrence from an array field
    Pull(String, Value),
}

/// Ordered list of mutations applied atomically to one row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    /// Operations in application order
    pub ops: Vec<PatchOp>,
}

impl Patch {
    /// Empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a field
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::Set(field.to_string(), value.into()));
        self
    }

    /// Add to a numeric field
    pub fn increment(mut self, field: &str, by: i64) -> Self {
        self.ops.push(PatchOp::Increment(field.to_string(), by));
        self
    }

    /// Flip a boolean field
    pub fn toggle(mut self, field: &str) -> Self {
        self.ops.push(PatchOp::Toggle(field.to_string()));
        self
    }

    /// Append to an array field unless present
    pub fn add_to_set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::AddToSet(field.to_string(), value.into()));
        self
    }

    /// Remove a value from an array field
    pub fn pull(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::Pull(field.to_string(), value.into()));
        self
    }

    /// Apply to a row in place, reporting per operation whether it changed anything
    pub fn apply(&self, row: &mut Value) -> StoreResult<Vec<bool>> {
        let Value::Object(map) = row else {
            return Err(StoreError::Corruption("patched row is not an object".into()));
        };

        self.ops
            .iter()
            .map(|op| match op {
                PatchOp::Set(field, value) => {
                    let previous = map.insert(field.clone(), value.clone());
                    Ok(previous.as_ref() != Some(value))
                }
                PatchOp::Increment(field, by) => {
                    let current = map.get(field).and_then(Value::as_i64).unwrap_or(0);
                    map.insert(field.clone(), Value::from(current.saturating_add(*by).max(0)));
                    Ok(*by != 0)
                }
                PatchOp::Toggle(field) => {
                    let current = map.get(field).and_then(Value::as_bool).unwrap_or(false);
                    map.insert(field.clone(), Value::Bool(!current));
                    Ok(true)
                }
                PatchOp::AddToSet(field, value) => {
                    let items = array_field(map, field)?;
                    if items.contains(value) {
                        Ok(false)
                    } else {
                        items.push(value.clone());
                        Ok(true)
                    }
                }
                PatchOp::Pull(field, value) => {
                    let items = array_field(map, field)?;
                    let before = items.len();
                    items.retain(|item| item != value);
                    Ok(items.len() != before)
                }
            })
            .collect()
    }
}

fn array_field<'a>(map: &'a mut serde_json::Map<String, Value>, field: &str) -> StoreResult<&'a mut Vec<Value>> {
    match map.entry(field.to_string()).or_insert_with(|| Value::Array(Vec::new())) {
        Value::Array(items) => Ok(items),
        _ => Err(StoreError::Corruption(format!("field '{field}' is not an array"))),
    }
}

/// Row after a successful patch
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    /// Row after the patch
    pub row: Value,
    /// Per operation, whether it changed the row
    pub applied: Vec<bool>,
}

/// Trait for entity store implementations
///
/// Every call is a single atomic step from the caller's point of view.
/// Reads do not block each other.
pub trait EntityStore: Send + Sync + 'static {
    /// Insert a new row; the row must carry `_id`
    fn insert(&self, collection: Collection, row: Value) -> StoreResult<()>;

    /// Fetch a row by id
    fn get(&self, collection: Collection, id: &ID16) -> StoreResult<Option<Value>>;

    /// Patch a row atomically; `None` when it does not exist
    fn update(&self, collection: Collection, id: &ID16, patch: &Patch) -> StoreResult<Option<PatchOutcome>>;

    /// Delete-if-exists, returning the removed row
    fn delete(&self, collection: Collection, id: &ID16) -> StoreResult<Option<Value>>;

    /// Execute a view plan
    fn query(&self, plan: &QueryPlan) -> StoreResult<Vec<Value>>;

    /// Count rows matching a predicate
    fn count(&self, collection: Collection, filter: &Filter) -> StoreResult<u64>;

    /// Delete every row matching a predicate, returning the removed rows
    fn delete_many(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>>;

    /// Patch every row matching a predicate, returning how many changed
    fn update_many(&self, collection: Collection, filter: &Filter, patch: &Patch) -> StoreResult<u64>;

    /// Atomic check-then-act on the (actor, target, kind) key: insert when
    /// absent, remove when present
    fn toggle_edge(&self, edge: Edge) -> StoreResult<ToggleOutcome>;

    /// First row of a plan
    fn query_one(&self, plan: &QueryPlan) -> StoreResult<Option<Value>> {
        Ok(self.query(plan)?.into_iter().next())
    }
}

/// Typed helpers over any [`EntityStore`]
pub trait TypedStore: EntityStore {
    /// Fetch and decode a record
    fn find<R: Record>(&self, id: &ID16) -> Result<Option<R>> {
        match self.get(R::COLLECTION, id)? {
            Some(row) => Ok(Some(serde_json::from_value(row).map_err(StoreError::from)?)),
            None => Ok(None),
        }
    }

    /// Encode and insert a record
    fn create<R: Record>(&self, record: &R) -> Result<()> {
        let row = serde_json::to_value(record).map_err(StoreError::from)?;
        Ok(self.insert(R::COLLECTION, row)?)
    }

    /// Patch a record and decode the result; `None` when it does not exist
    fn patch<R: Record>(&self, id: &ID16, patch: &Patch) -> Result<Option<(R, Vec<bool>)>> {
        match self.update(R::COLLECTION, id, patch)? {
            Some(outcome) => {
                let record = serde_json::from_value(outcome.row).map_err(StoreError::from)?;
                Ok(Some((record, outcome.applied)))
            }
            None => Ok(None),
        }
    }
}

/// Blanket implementation for any store
impl<T: EntityStore + ?Sized> TypedStore for T {}

/// In-memory plan executor
pub mod pipeline;

/// DashMap-backed store
pub mod mem_store;

pub use mem_store::{MemStore, StoreSnapshot};
