//! Relation toggle engine
//!
//! Creates or removes the single edge between an actor and a target. The
//! existence check of the target happens first; the edge itself is flipped by
//! one atomic store call on the (actor, target, kind) key.

use tracing::debug;
use crate::storage::EntityStore;
use crate::system::metrics::Metrics;
use crate::types::{Edge, EdgeKind, EdgeTarget, Error, Result, StoreError, ToggleOutcome, UserId};

/// Flip the edge for (actor, target, kind)
///
/// Fails with `InvalidArgument` when the target cannot carry `kind` or the
/// actor subscribes to themself, `NotFound` when the target is missing and
/// `Conflict` when the store reports an unreconcilable concurrent state.
pub fn toggle_edge<S: EntityStore + ?Sized>(
    store: &S,
    actor: UserId,
    target: EdgeTarget,
    kind: EdgeKind,
) -> Result<ToggleOutcome> {
    let metrics = Metrics::global();

    if target.edge_kind() != kind {
        metrics.relations.toggles_rejected.inc();
        return Err(Error::invalid_argument(format!(
            "a {:?} edge cannot target a {}",
            kind,
            target.type_name()
        )));
    }
    if let EdgeTarget::Channel(channel) = target {
        if channel == actor {
            metrics.relations.toggles_rejected.inc();
            return Err(Error::invalid_argument("a user cannot subscribe to their own channel"));
        }
    }

    if store.get(target.collection(), &target.id())?.is_none() {
        metrics.relations.toggles_rejected.inc();
        return Err(Error::not_found(format!("{} {}", target.type_name(), target.id())));
    }

    let outcome = store.toggle_edge(Edge::new(actor, target, kind)).map_err(|e| match e {
        StoreError::Conflict(reason) => Error::conflict(reason),
        other => Error::from(other),
    })?;

    if outcome.edge_now_exists {
        metrics.relations.edges_created.inc();
    } else {
        metrics.relations.edges_removed.inc();
    }
    debug!(
        %actor,
        kind = ?kind,
        target = target.type_name(),
        target_id = %target.id(),
        exists = outcome.edge_now_exists,
        "edge toggled"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemStore, TypedStore};
    use crate::types::{Collection, ErrorKind, User, ID16};
    use crate::view::Filter;
    use proptest::prelude::*;

    fn store_with_user() -> (MemStore, User) {
        let store = MemStore::new();
        let user = User::new("ana", "Ana", "a");
        store.create(&user).unwrap();
        (store, user)
    }

    #[test]
    fn test_missing_target_is_not_found() {
        let store = MemStore::new();
        let err = toggle_edge(&store, ID16::random(), EdgeTarget::Video(ID16::random()), EdgeKind::Like).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.len(Collection::Likes), 0);
    }

    #[test]
    fn test_kind_mismatch_is_invalid() {
        let (store, user) = store_with_user();
        let err = toggle_edge(&store, ID16::random(), EdgeTarget::Channel(user.id), EdgeKind::Like).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_self_subscription_is_invalid() {
        let (store, user) = store_with_user();
        let err = toggle_edge(&store, user.id, EdgeTarget::Channel(user.id), EdgeKind::Subscription).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(store.len(Collection::Subscriptions), 0);
    }

    #[test]
    fn test_subscription_round_trip() {
        let (store, channel) = store_with_user();
        let fan = ID16::random();
        let target = EdgeTarget::Channel(channel.id);

        assert!(toggle_edge(&store, fan, target, EdgeKind::Subscription).unwrap().edge_now_exists);
        assert_eq!(store.count(Collection::Subscriptions, &Filter::eq("target.id", channel.id)).unwrap(), 1);
        assert!(!toggle_edge(&store, fan, target, EdgeKind::Subscription).unwrap().edge_now_exists);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

        #[test]
        fn toggling_twice_restores_existence(pre_existing in any::<bool>(), actors in 1usize..4) {
            let (store, channel) = store_with_user();
            let actor = ID16::random();
            let target = EdgeTarget::Channel(channel.id);

            // Unrelated edges on the same target must not be disturbed
            for _ in 0..actors {
                toggle_edge(&store, ID16::random(), target, EdgeKind::Subscription).unwrap();
            }
            if pre_existing {
                toggle_edge(&store, actor, target, EdgeKind::Subscription).unwrap();
            }
            let before = store.len(Collection::Subscriptions);

            let first = toggle_edge(&store, actor, target, EdgeKind::Subscription).unwrap();
            let second = toggle_edge(&store, actor, target, EdgeKind::Subscription).unwrap();

            prop_assert_eq!(first.edge_now_exists, !pre_existing);
            prop_assert_eq!(second.edge_now_exists, pre_existing);
            prop_assert_eq!(store.len(Collection::Subscriptions), before);
        }
    }
}
