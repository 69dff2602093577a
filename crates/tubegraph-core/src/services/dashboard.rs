use serde_json::Value;
use crate::constants::ID_FIELD;
use crate::services::videos::card_query;
use crate::services::Platform;
use crate::storage::EntityStore;
use crate::types::{Collection, Result};
use crate::view::rows::{decode_rows, ChannelStats, VideoCard};
use crate::view::{Filter, Page, ViewQuery};

impl<S: EntityStore> Platform<S> {
    /// Totals for a channel: videos, views, subscribers and likes on its videos
    ///
    /// Unpublished videos count as well; every number reflects the store at
    /// query time.
    pub fn get_channel_stats(&self, channel: &str) -> Result<ChannelStats> {
        let channel = self.existing_user("channel", channel)?;

        let videos = self
            .store
            .query(&ViewQuery::from(Collection::Videos).filter(Filter::eq("owner", channel)).build())?;
        let total_views = videos.iter().filter_map(|v| v.get("views").and_then(Value::as_u64)).sum();
        let video_ids: Vec<Value> = videos.iter().filter_map(|v| v.get(ID_FIELD).cloned()).collect();

        let total_likes = if video_ids.is_empty() {
            0
        } else {
            let on_videos = Filter::eq("target.type", "video").and(Filter::is_in("target.id", video_ids));
            self.store.count(Collection::Likes, &on_videos)?
        };
        let total_subscribers = self.store.count(Collection::Subscriptions, &Filter::eq("target.id", channel))?;

        Ok(ChannelStats {
            channel,
            total_videos: videos.len() as u64,
            total_views,
            total_subscribers,
            total_likes,
        })
    }

    /// Every video of a channel, published or not, newest first
    pub fn get_channel_videos(&self, channel: &str, page: Page) -> Result<Vec<VideoCard>> {
        let channel = self.existing_user("channel", channel)?;
        let plan = card_query(Filter::eq("owner", channel)).page(page).build();
        decode_rows(self.store.query(&plan)?)
    }
}
