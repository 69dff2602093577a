use tracing::debug;
use crate::cascade::CascadeTarget;
use crate::constants::{ID_FIELD, UPDATED_AT_FIELD};
use crate::guard::authorize_owner;
use crate::services::{optional_text, required_text, Platform};
use crate::storage::{EntityStore, Patch, TypedStore};
use crate::types::{current_timestamp, parse_id, Collection, Error, Playlist, Result, UserId, Video, ID16};
use crate::view::rows::{decode_rows, PlaylistView};
use crate::view::{Filter, Lookup, Page, ViewQuery};

/// Fields of a video shown inside a playlist
const PLAYLIST_VIDEO_FIELDS: &[&str] = &["_id", "title", "description", "thumbnail", "videoFile", "duration", "views"];

/// Changes to a playlist's details
#[derive(Debug, Clone, Default)]
pub struct PlaylistUpdate {
    /// New name; must not be blank
    pub name: Option<String>,
    /// New description; may be empty
    pub description: Option<String>,
}

fn playlist_query(filter: Filter) -> ViewQuery {
    ViewQuery::from(Collection::Playlists)
        .filter(filter)
        .join(Lookup::many(Collection::Videos, "videos", "videos").project(PLAYLIST_VIDEO_FIELDS))
}

impl<S: EntityStore> Platform<S> {
    /// Create an empty playlist
    pub fn create_playlist(&self, actor: &UserId, name: &str, description: &str) -> Result<Playlist> {
        let name = required_text("name", name)?;

        let now = current_timestamp();
        let playlist = Playlist {
            id: ID16::random(),
            owner: *actor,
            name,
            description: description.trim().to_string(),
            videos: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.store.create(&playlist)?;
        debug!(playlist = %playlist.id, owner = %actor, "playlist created");
        Ok(playlist)
    }

    /// Playlists of an existing user with their videos resolved
    pub fn get_user_playlists(&self, user: &str, page: Page) -> Result<Vec<PlaylistView>> {
        let user = self.existing_user("user", user)?;
        let plan = playlist_query(Filter::eq("owner", user)).page(page).build();
        decode_rows(self.store.query(&plan)?)
    }

    /// One playlist with its videos in playlist order; only its owner may read it
    pub fn get_playlist_by_id(&self, actor: &UserId, id: &str) -> Result<PlaylistView> {
        let id = parse_id("playlist", id)?;
        let playlist: Playlist = self.load(&id)?;
        authorize_owner(&playlist, actor, "playlist")?;

        let row = self
            .store
            .query_one(&playlist_query(Filter::eq(ID_FIELD, id)).build())?
            .ok_or_else(|| Error::not_found(format!("playlist {id}")))?;
        decode_rows(vec![row])?
            .pop()
            .ok_or_else(|| Error::not_found(format!("playlist {id}")))
    }

    /// Append a video; adding a video twice is rejected
    pub fn add_video_to_playlist(&self, actor: &UserId, playlist: &str, video: &str) -> Result<Playlist> {
        let playlist_id = parse_id("playlist", playlist)?;
        let video_id = parse_id("video", video)?;

        let playlist: Playlist = self.load(&playlist_id)?;
        authorize_owner(&playlist, actor, "playlist")?;
        self.load::<Video>(&video_id)?;
        if playlist.videos.contains(&video_id) {
            return Err(already_present(video_id));
        }

        let patch = Patch::new().add_to_set("videos", video_id).set(UPDATED_AT_FIELD, current_timestamp());
        match self.store.patch::<Playlist>(&playlist_id, &patch)? {
            Some((_, applied)) if applied.first() == Some(&false) => Err(already_present(video_id)),
            Some((playlist, _)) => Ok(playlist),
            None => Err(Error::not_found(format!("playlist {playlist_id}"))),
        }
    }

    /// Remove a video from a playlist; removing an absent video is rejected
    pub fn remove_video_from_playlist(&self, actor: &UserId, playlist: &str, video: &str) -> Result<Playlist> {
        let playlist_id = parse_id("playlist", playlist)?;
        let video_id = parse_id("video", video)?;

        let playlist: Playlist = self.load(&playlist_id)?;
        authorize_owner(&playlist, actor, "playlist")?;

        let patch = Patch::new().pull("videos", video_id).set(UPDATED_AT_FIELD, current_timestamp());
        match self.store.patch::<Playlist>(&playlist_id, &patch)? {
            Some((_, applied)) if applied.first() == Some(&false) => {
                Err(Error::invalid_argument(format!("video {video_id} is not in this playlist")))
            }
            Some((playlist, _)) => Ok(playlist),
            None => Err(Error::not_found(format!("playlist {playlist_id}"))),
        }
    }

    /// Rename or re-describe one's own playlist
    pub fn update_playlist(&self, actor: &UserId, id: &str, update: PlaylistUpdate) -> Result<Playlist> {
        let id = parse_id("playlist", id)?;
        let payload = match (&update.name, &update.description) {
            (None, None) => Err(Error::invalid_argument("nothing to update")),
            (name, description) => optional_text("name", name.as_deref())
                .map(|name| (name, description.as_deref().map(|d| d.trim().to_string()))),
        };

        let playlist: Playlist = self.load(&id)?;
        authorize_owner(&playlist, actor, "playlist")?;
        let (name, description) = payload?;

        let mut patch = Patch::new();
        if let Some(name) = name {
            patch = patch.set("name", name);
        }
        if let Some(description) = description {
            patch = patch.set("description", description);
        }
        patch = patch.set(UPDATED_AT_FIELD, current_timestamp());

        let (playlist, _) = self
            .store
            .patch::<Playlist>(&id, &patch)?
            .ok_or_else(|| Error::not_found(format!("playlist {id}")))?;
        Ok(playlist)
    }

    /// Delete one's own playlist; the videos in it are untouched
    pub async fn delete_playlist(&self, actor: &UserId, id: &str) -> Result<Playlist> {
        let id = parse_id("playlist", id)?;
        let playlist: Playlist = self.load(&id)?;
        authorize_owner(&playlist, actor, "playlist")?;

        self.cascade.delete(CascadeTarget::Playlist(id)).await?;
        Ok(playlist)
    }
}

fn already_present(video: ID16) -> Error {
    Error::invalid_argument(format!("video {video} is already in this playlist"))
}
