//! The seam between the session core and whatever actually carries audio.

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::oneshot;

use super::error::VoiceResult;
use super::source::AudioSource;

/// Control surface of a track that is already handed to the transport.
pub trait TrackControl: Send + Sync {
    fn pause(&self) -> VoiceResult<()>;
    fn resume(&self) -> VoiceResult<()>;
    fn stop(&self) -> VoiceResult<()>;
}

/// A track the transport accepted.
pub struct StartedTrack {
    pub control: Arc<dyn TrackControl>,
    /// Fires (or is dropped) once the transport stops producing audio for the
    /// track, whether it ran out or was stopped.
    pub ended: oneshot::Receiver<()>,
}

/// Voice connection management and playback for a guild.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Join `channel_id`, or move there if already connected elsewhere.
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> VoiceResult<()>;

    /// Tear down the guild's voice connection.
    async fn disconnect(&self, guild_id: GuildId) -> VoiceResult<()>;

    /// Start `source` on the guild's connection.
    async fn start(&self, guild_id: GuildId, source: &AudioSource) -> VoiceResult<StartedTrack>;
}
