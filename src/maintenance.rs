//! Maintenance commands behind the `tubegraph` binary

use std::collections::BTreeMap;
use serde::Serialize;
use tracing::info;
use tubegraph_core::{Collection, ReconciliationEntry, ReconciliationLog, TypedStore, User};
use crate::core::{AppState, Result};

/// Store contents and journal backlog
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    /// Rows per collection, edges included
    pub counts: BTreeMap<String, usize>,
    /// Journal entries still waiting for reconciliation
    pub pending: Vec<PendingEntry>,
}

/// Journal entry as shown to an operator
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEntry {
    /// Entry identifier
    pub id: String,
    /// Step the cascade stopped at
    pub failed_step: String,
    /// Error that stopped it
    pub error: String,
    /// RFC 3339 time the entry was written
    pub recorded_at: String,
}

impl From<&ReconciliationEntry> for PendingEntry {
    fn from(entry: &ReconciliationEntry) -> Self {
        let recorded_at = chrono::DateTime::from_timestamp_nanos(entry.recorded_at.min(i64::MAX as u64) as i64);
        Self {
            id: entry.id.to_string(),
            failed_step: serde_json::to_value(entry.failed_step)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            error: entry.error.clone(),
            recorded_at: recorded_at.to_rfc3339(),
        }
    }
}

/// Demo data written by [`seed`]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    /// Channel every demo user subscribes to
    pub channel: String,
    /// Users created, the channel included
    pub users: usize,
    /// Subscriptions created
    pub subscriptions: usize,
    /// Posts created
    pub posts: usize,
}

/// Count every collection and list pending journal entries
pub fn stats(state: &AppState) -> Result<StatsReport> {
    let counts = Collection::ENTITIES
        .iter()
        .chain([Collection::Likes, Collection::Subscriptions].iter())
        .map(|c| (c.as_str().to_string(), state.store.len(*c)))
        .collect();

    let pending = state
        .platform
        .cascade()
        .journal()
        .pending()?
        .iter()
        .map(PendingEntry::from)
        .collect();

    Ok(StatsReport { counts, pending })
}

/// Create a channel plus `users` demo users subscribed to it, each with one post
pub fn seed(state: &AppState, users: usize) -> Result<SeedReport> {
    let platform = &state.platform;
    let channel = User::new("demo-channel", "Demo Channel", "");
    platform.store().create(&channel)?;
    let channel_id = channel.id.to_string();

    let mut report = SeedReport { channel: channel_id.clone(), users: 1, subscriptions: 0, posts: 0 };
    for i in 1..=users {
        let user = User::new(format!("demo-{i}"), format!("Demo User {i}"), "");
        platform.store().create(&user)?;
        report.users += 1;

        if platform.toggle_subscription(&user.id, &channel_id)?.edge_now_exists {
            report.subscriptions += 1;
        }
        platform.create_post(&user.id, &format!("Hello from demo user {i}"))?;
        report.posts += 1;
    }

    info!(channel = %channel_id, users = report.users, "Seeded demo data");
    Ok(report)
}
