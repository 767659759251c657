//! Per-guild voice sessions: connection bookkeeping, single-track playback,
//! automatic recovery from involuntary disconnects, and attribution of forced
//! disconnects.

pub mod attributor;
pub mod error;
pub mod platform;
pub mod playback;
pub mod registry;
pub mod songbird_transport;
pub mod source;
pub mod supervisor;
pub mod transport;

use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::Config;
pub use attributor::{Attribution, AuditTrail, DirectMessenger, DisconnectAttributor, DisconnectEntry};
pub use error::{VoiceError, VoiceResult};
pub use playback::{PlaybackCompletion, PlaybackController, TrackEnd};
pub use registry::{GuildVoiceState, LeaveStart, PlaybackStatus, VoiceConnection, VoiceSessionRegistry};
pub use source::{AudioSource, SourceResolver, StreamInfo};
pub use supervisor::{ReconnectPolicy, ReconnectSupervisor, VoiceStateOutcome};
pub use transport::{StartedTrack, TrackControl, VoiceTransport};

/// Everything the command surface and the event handler need, wired to one
/// registry.
pub struct VoiceService {
    pub registry: Arc<VoiceSessionRegistry>,
    pub playback: PlaybackController,
    pub supervisor: ReconnectSupervisor,
    pub resolver: SourceResolver,
    transport: Arc<dyn VoiceTransport>,
    leave_after_stream: bool,
}

impl VoiceService {
    pub fn new(
        config: &Config,
        bot_id: UserId,
        transport: Arc<dyn VoiceTransport>,
        audit: Arc<dyn AuditTrail>,
        messenger: Arc<dyn DirectMessenger>,
    ) -> Self {
        let registry = Arc::new(VoiceSessionRegistry::new(config.voice.leave_intent_ttl));
        let attributor = Arc::new(DisconnectAttributor::new(bot_id, audit, messenger));
        let policy = ReconnectPolicy {
            max_attempts: config.reconnect.max_attempts,
            backoff: config.reconnect.backoff,
        };

        Self {
            playback: PlaybackController::new(Arc::clone(&registry), Arc::clone(&transport)),
            supervisor: ReconnectSupervisor::new(
                Arc::clone(&registry),
                Arc::clone(&transport),
                attributor,
                policy,
            ),
            resolver: SourceResolver::new(&config.voice.audio_dir, &config.voice.ytdlp_path),
            registry,
            transport,
            leave_after_stream: config.voice.leave_after_stream,
        }
    }

    /// Join `channel_id`. Any leftover leave intent is withdrawn first so it
    /// cannot swallow a later involuntary drop.
    pub async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> VoiceResult<()> {
        self.registry.set_manual_disconnect(guild_id, false).await;
        self.transport.connect(guild_id, channel_id).await?;
        self.registry.set_connected(guild_id, channel_id).await;
        info!("Joined channel {} in guild {}", channel_id, guild_id);
        Ok(())
    }

    /// Leave voice on request. The leave intent is recorded before the
    /// disconnect so the resulting event is recognised as voluntary. During a
    /// reconnect the intent alone is enough: the supervisor gives up.
    pub async fn leave(&self, guild_id: GuildId) -> VoiceResult<()> {
        match self.registry.begin_leave(guild_id, false).await {
            LeaveStart::Connected => self.disconnect(guild_id).await,
            LeaveStart::Reconnecting => {
                info!("Leave requested during reconnect in guild {}", guild_id);
                Ok(())
            }
            LeaveStart::NotConnected | LeaveStart::Busy => Err(VoiceError::AlreadyDisconnected),
        }
    }

    /// Second half of a leave whose intent is already recorded.
    async fn disconnect(&self, guild_id: GuildId) -> VoiceResult<()> {
        self.playback.stop(guild_id).await;

        if let Err(e) = self.transport.disconnect(guild_id).await {
            // no disconnect event will follow, so the intent must not linger
            self.registry.set_manual_disconnect(guild_id, false).await;
            if e == VoiceError::NotConnected {
                self.registry.mark_disconnected(guild_id).await;
                return Err(VoiceError::AlreadyDisconnected);
            }
            return Err(e);
        }

        info!("Leaving voice in guild {}", guild_id);
        Ok(())
    }

    /// Play a file from the audio directory on the existing connection.
    pub async fn play_local(&self, guild_id: GuildId, filename: &str) -> VoiceResult<(AudioSource, PlaybackCompletion)> {
        if self.registry.connection(guild_id).await.is_none() {
            return Err(VoiceError::NotConnected);
        }
        let source = self.resolver.resolve_local(filename).await?;
        let completion = self.playback.play(guild_id, source.clone()).await?;
        Ok((source, completion))
    }

    /// Resolve `url`, make sure the bot is in `channel_id` (joining only if it
    /// isn't connected anywhere yet), then play the stream.
    ///
    /// Resolution happens first, so a bad URL leaves the connection untouched.
    pub async fn play_remote(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        url: &str,
    ) -> VoiceResult<(AudioSource, PlaybackCompletion)> {
        let source = self.resolver.resolve_remote(url).await?;

        if self.registry.connection(guild_id).await.is_none() {
            self.join(guild_id, channel_id).await?;
        }

        let completion = self.playback.play(guild_id, source.clone()).await?;
        Ok((source, completion))
    }

    /// Leave once `completion` reports a natural end. Skips and replacements
    /// keep the bot connected.
    pub fn leave_when_finished(self: &Arc<Self>, guild_id: GuildId, completion: PlaybackCompletion) {
        if !self.leave_after_stream {
            return;
        }

        let service = Arc::clone(self);
        tokio::spawn(async move {
            if completion.await != TrackEnd::Finished {
                return;
            }
            // a track started since keeps the bot in the channel
            if service.registry.begin_leave(guild_id, true).await != LeaveStart::Connected {
                return;
            }
            match service.disconnect(guild_id).await {
                Ok(()) => info!("Stream finished, left voice in guild {}", guild_id),
                Err(VoiceError::AlreadyDisconnected) => {}
                Err(e) => error!("Failed to leave after stream in guild {}: {}", guild_id, e),
            }
        });
    }

    /// Forget a guild the bot no longer belongs to.
    pub async fn forget_guild(&self, guild_id: GuildId) {
        self.registry.mark_disconnected(guild_id).await;
        if !self.registry.evict(guild_id) {
            debug!("No voice state to evict for guild {}", guild_id);
        }
    }
}
