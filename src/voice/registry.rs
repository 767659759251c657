//! Per-guild voice state.
//!
//! Each guild gets its own lock so the command path and the gateway event
//! path serialize per guild while different guilds never contend. A `leave`
//! records its intent under that lock before the disconnect is issued, which
//! makes the intent visible to the disconnect event it causes.

use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::source::AudioSource;
use super::transport::TrackControl;

/// The voice channel the bot holds in a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceConnection {
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

/// The track currently handed to the transport.
pub struct Playback {
    pub(crate) generation: u64,
    pub(crate) source: AudioSource,
    pub(crate) status: PlaybackStatus,
    pub(crate) control: Arc<dyn TrackControl>,
}

impl Playback {
    pub(crate) fn new(generation: u64, source: AudioSource, control: Arc<dyn TrackControl>) -> Self {
        Self {
            generation,
            source,
            status: PlaybackStatus::Playing,
            control,
        }
    }

    pub fn source(&self) -> &AudioSource {
        &self.source
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Stop the underlying track. Errors are logged; the playback is gone from
    /// the session either way.
    pub(crate) fn halt(mut self) {
        if let Err(e) = self.control.stop() {
            warn!("Failed to stop track '{}': {}", self.source.describe(), e);
        }
        self.status = PlaybackStatus::Stopped;
    }
}

impl fmt::Debug for Playback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Playback")
            .field("generation", &self.generation)
            .field("source", &self.source)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Where a `leave` found the session when it recorded its intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveStart {
    /// Connected; the caller must disconnect.
    Connected,
    /// Dropped and being reconnected; the supervisor abandons the reconnect.
    Reconnecting,
    /// Nothing to leave. No intent was recorded.
    NotConnected,
    /// A track is still playing. No intent was recorded.
    Busy,
}

/// Everything the bot tracks about one guild's voice session.
#[derive(Debug, Default)]
pub struct GuildVoiceState {
    pub(crate) connection: Option<VoiceConnection>,
    /// Expiry of a pending `leave`, if any.
    pub(crate) leave_intent: Option<Instant>,
    pub(crate) playback: Option<Playback>,
    /// Set while the supervisor tries to get back into a dropped channel.
    pub(crate) reconnecting: bool,
}

impl GuildVoiceState {
    pub(crate) fn request_leave(&mut self, ttl: Duration, now: Instant) {
        self.leave_intent = Some(now + ttl);
    }

    pub(crate) fn clear_leave(&mut self) {
        self.leave_intent = None;
    }

    pub(crate) fn leave_pending(&self, now: Instant) -> bool {
        self.leave_intent.is_some_and(|expires| now < expires)
    }

    /// Consume the leave intent. Returns whether it was still live; an expired
    /// intent is discarded and reported as absent.
    pub(crate) fn take_leave(&mut self, now: Instant) -> bool {
        self.leave_intent.take().is_some_and(|expires| now < expires)
    }

    pub(crate) fn connect(&mut self, channel_id: ChannelId) {
        self.connection = Some(VoiceConnection { channel_id });
    }

    /// Drop the connection. Playback cannot outlive it, so it is handed back
    /// for the caller to stop.
    pub(crate) fn disconnect(&mut self) -> Option<Playback> {
        self.connection = None;
        self.playback.take()
    }
}

/// Keyed store of [`GuildVoiceState`] with one lock per guild.
pub struct VoiceSessionRegistry {
    guilds: DashMap<GuildId, Arc<Mutex<GuildVoiceState>>>,
    leave_intent_ttl: Duration,
    generation: AtomicU64,
}

impl VoiceSessionRegistry {
    pub fn new(leave_intent_ttl: Duration) -> Self {
        Self {
            guilds: DashMap::new(),
            leave_intent_ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// State for `guild_id`, created on first use.
    pub fn guild(&self, guild_id: GuildId) -> Arc<Mutex<GuildVoiceState>> {
        Arc::clone(&self.guilds.entry(guild_id).or_default())
    }

    /// State for `guild_id` if the guild has been seen before.
    pub fn existing(&self, guild_id: GuildId) -> Option<Arc<Mutex<GuildVoiceState>>> {
        self.guilds.get(&guild_id).map(|entry| Arc::clone(&entry))
    }

    /// Record or withdraw a pending `leave`.
    pub async fn set_manual_disconnect(&self, guild_id: GuildId, requested: bool) {
        let state = self.guild(guild_id);
        let mut state = state.lock().await;
        if requested {
            state.request_leave(self.leave_intent_ttl, Instant::now());
            debug!("Leave intent set for guild {}", guild_id);
        } else {
            state.clear_leave();
        }
    }

    /// Check the session and record a leave intent in one critical section.
    /// With `require_idle` the intent is only recorded when nothing is playing.
    pub async fn begin_leave(&self, guild_id: GuildId, require_idle: bool) -> LeaveStart {
        let Some(state) = self.existing(guild_id) else {
            return LeaveStart::NotConnected;
        };
        let mut state = state.lock().await;

        if require_idle && state.playback.is_some() {
            return LeaveStart::Busy;
        }
        let start = if state.connection.is_some() {
            LeaveStart::Connected
        } else if state.reconnecting {
            LeaveStart::Reconnecting
        } else {
            return LeaveStart::NotConnected;
        };

        state.request_leave(self.leave_intent_ttl, Instant::now());
        debug!("Leave intent set for guild {} ({:?})", guild_id, start);
        start
    }

    /// Give up a reconnect if a leave arrived in the meantime. The intent is
    /// consumed since no disconnect event will follow.
    pub async fn cancel_reconnect_on_leave(&self, guild_id: GuildId) -> bool {
        let state = self.guild(guild_id);
        let mut state = state.lock().await;
        if state.take_leave(Instant::now()) {
            state.reconnecting = false;
            true
        } else {
            false
        }
    }

    /// Record a successful reconnect. Returns `false` without recording the
    /// connection when a leave arrived while the join was in flight; the
    /// intent stays pending for the disconnect the caller now issues.
    pub async fn complete_reconnect(&self, guild_id: GuildId, channel_id: ChannelId) -> bool {
        let state = self.guild(guild_id);
        let mut state = state.lock().await;
        state.reconnecting = false;
        if state.leave_pending(Instant::now()) {
            return false;
        }
        state.connect(channel_id);
        true
    }

    /// Reconnect gave up. Any leave intent is moot since nothing is connected.
    pub async fn abandon_reconnect(&self, guild_id: GuildId) {
        let state = self.guild(guild_id);
        let mut state = state.lock().await;
        state.reconnecting = false;
        state.clear_leave();
    }

    pub async fn is_manual_disconnect(&self, guild_id: GuildId) -> bool {
        match self.existing(guild_id) {
            Some(state) => state.lock().await.leave_pending(Instant::now()),
            None => false,
        }
    }

    /// Consume the pending `leave` exactly once.
    pub async fn take_manual_disconnect(&self, guild_id: GuildId) -> bool {
        match self.existing(guild_id) {
            Some(state) => state.lock().await.take_leave(Instant::now()),
            None => false,
        }
    }

    pub async fn connection(&self, guild_id: GuildId) -> Option<VoiceConnection> {
        let state = self.existing(guild_id)?;
        let state = state.lock().await;
        state.connection
    }

    pub async fn set_connected(&self, guild_id: GuildId, channel_id: ChannelId) {
        let state = self.guild(guild_id);
        state.lock().await.connect(channel_id);
        debug!("Guild {} connected to channel {}", guild_id, channel_id);
    }

    /// Forget the connection and stop whatever was playing on it.
    pub async fn mark_disconnected(&self, guild_id: GuildId) {
        let Some(state) = self.existing(guild_id) else {
            return;
        };
        let playback = state.lock().await.disconnect();
        if let Some(playback) = playback {
            playback.halt();
        }
    }

    pub async fn playback_status(&self, guild_id: GuildId) -> Option<PlaybackStatus> {
        let state = self.existing(guild_id)?;
        let state = state.lock().await;
        state.playback.as_ref().map(Playback::status)
    }

    /// Remove a guild entirely, e.g. once the bot leaves it.
    pub fn evict(&self, guild_id: GuildId) -> bool {
        let removed = self.guilds.remove(&guild_id).is_some();
        if removed {
            info!("Evicted voice state for guild {}", guild_id);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    pub(crate) fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GUILD: GuildId = GuildId::new(1);
    const CHANNEL: ChannelId = ChannelId::new(10);

    fn registry() -> VoiceSessionRegistry {
        VoiceSessionRegistry::new(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn unknown_guild_defaults() {
        let registry = registry();

        assert!(!registry.is_manual_disconnect(GUILD).await);
        assert!(!registry.take_manual_disconnect(GUILD).await);
        assert_eq!(registry.connection(GUILD).await, None);
        // reads never create entries
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn intent_is_consumed_exactly_once() {
        let registry = registry();
        registry.set_manual_disconnect(GUILD, true).await;

        assert!(registry.is_manual_disconnect(GUILD).await);
        assert!(registry.take_manual_disconnect(GUILD).await);
        assert!(!registry.take_manual_disconnect(GUILD).await);
        assert!(!registry.is_manual_disconnect(GUILD).await);
    }

    #[tokio::test]
    async fn withdrawn_intent_is_gone() {
        let registry = registry();
        registry.set_manual_disconnect(GUILD, true).await;
        registry.set_manual_disconnect(GUILD, false).await;

        assert!(!registry.take_manual_disconnect(GUILD).await);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_intent_expires() {
        let registry = registry();
        registry.set_manual_disconnect(GUILD, true).await;

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(!registry.is_manual_disconnect(GUILD).await);
        assert!(!registry.take_manual_disconnect(GUILD).await);
    }

    #[tokio::test]
    async fn moving_replaces_the_connection() {
        let registry = registry();
        registry.set_connected(GUILD, CHANNEL).await;

        registry.set_connected(GUILD, ChannelId::new(11)).await;
        assert_eq!(
            registry.connection(GUILD).await.map(|c| c.channel_id),
            Some(ChannelId::new(11))
        );
    }

    #[tokio::test]
    async fn eviction_forgets_everything() {
        let registry = registry();
        registry.set_connected(GUILD, CHANNEL).await;
        registry.set_manual_disconnect(GUILD, true).await;

        assert!(registry.evict(GUILD));
        assert!(!registry.evict(GUILD));
        assert_eq!(registry.connection(GUILD).await, None);
        assert!(!registry.is_manual_disconnect(GUILD).await);
    }

    #[tokio::test]
    async fn leave_needs_something_to_leave() {
        let registry = registry();
        assert_eq!(registry.begin_leave(GUILD, false).await, LeaveStart::NotConnected);

        registry.set_connected(GUILD, CHANNEL).await;
        registry.mark_disconnected(GUILD).await;
        assert_eq!(registry.begin_leave(GUILD, false).await, LeaveStart::NotConnected);
        assert!(!registry.is_manual_disconnect(GUILD).await);
    }

    #[tokio::test]
    async fn leave_during_reconnect_cancels_it() {
        let registry = registry();
        registry.guild(GUILD).lock().await.reconnecting = true;

        assert_eq!(registry.begin_leave(GUILD, false).await, LeaveStart::Reconnecting);
        assert!(registry.cancel_reconnect_on_leave(GUILD).await);
        assert!(!registry.is_manual_disconnect(GUILD).await);
        assert!(!registry.guild(GUILD).lock().await.reconnecting);
    }

    #[tokio::test]
    async fn leave_during_join_keeps_the_intent_for_the_disconnect() {
        let registry = registry();
        registry.guild(GUILD).lock().await.reconnecting = true;
        registry.begin_leave(GUILD, false).await;

        assert!(!registry.complete_reconnect(GUILD, CHANNEL).await);
        assert_eq!(registry.connection(GUILD).await, None);
        assert!(registry.is_manual_disconnect(GUILD).await);
    }

    #[tokio::test]
    async fn reconnect_without_leave_records_the_channel() {
        let registry = registry();
        registry.guild(GUILD).lock().await.reconnecting = true;

        assert!(!registry.cancel_reconnect_on_leave(GUILD).await);
        assert!(registry.complete_reconnect(GUILD, CHANNEL).await);
        assert_eq!(
            registry.connection(GUILD).await,
            Some(VoiceConnection { channel_id: CHANNEL })
        );
    }

    #[test]
    fn generations_are_unique() {
        let registry = registry();
        let a = registry.next_generation();
        let b = registry.next_generation();
        assert_ne!(a, b);
    }
}
