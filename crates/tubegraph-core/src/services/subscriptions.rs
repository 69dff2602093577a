use crate::relation::toggle_edge;
use crate::services::Platform;
use crate::storage::EntityStore;
use crate::types::{parse_id, Collection, EdgeKind, EdgeTarget, Result, ToggleOutcome, UserId};
use crate::view::rows::{decode_rows, SubscribedChannel, SubscriberView};
use crate::view::{CountJoin, Filter, Lookup, Page, ViewQuery};

impl<S: EntityStore> Platform<S> {
    /// Subscribe to or unsubscribe from a channel
    pub fn toggle_subscription(&self, actor: &UserId, channel: &str) -> Result<ToggleOutcome> {
        let target = EdgeTarget::Channel(parse_id("channel", channel)?);
        toggle_edge(self.store.as_ref(), *actor, target, EdgeKind::Subscription)
    }

    /// Subscribers of an existing channel, most recent first
    pub fn get_channel_subscribers(&self, channel: &str, page: Page) -> Result<Vec<SubscriberView>> {
        let channel = self.existing_user("channel", channel)?;
        let plan = ViewQuery::from(Collection::Subscriptions)
            .filter(Filter::eq("target.id", channel))
            .join(Lookup::profile("actor", "subscriber").required())
            .page(page)
            .build();
        decode_rows(self.store.query(&plan)?)
    }

    /// Channels an existing user subscribes to, with their subscriber counts
    pub fn get_subscribed_channels(&self, subscriber: &str, page: Page) -> Result<Vec<SubscribedChannel>> {
        let subscriber = self.existing_user("subscriber", subscriber)?;
        let plan = ViewQuery::from(Collection::Subscriptions)
            .filter(Filter::eq("actor", subscriber))
            .join(Lookup::profile("target.id", "channel").required())
            .count(CountJoin::new(Collection::Subscriptions, "target.id", "subscribersCount").keyed_by("target.id"))
            .page(page)
            .build();
        decode_rows(self.store.query(&plan)?)
    }
}
