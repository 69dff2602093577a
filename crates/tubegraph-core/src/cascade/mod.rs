//! Dependent cleanup when a parent entity is deleted.

/// Reconciliation entries and logs
pub mod journal;
/// The cascade sequence, replay and integrity sweep
pub mod coordinator;

pub use coordinator::{CascadeCoordinator, ReconcileReport, SweepReport};
pub use journal::{CascadeStep, CascadeTarget, MemJournal, ReconcileAction, ReconciliationEntry, ReconciliationLog};
