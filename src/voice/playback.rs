//! Single-track playback per guild.
//!
//! There is no queue: starting a track replaces whatever was playing. The
//! transport reports end-of-track through a oneshot; a watcher task turns
//! that into a [`TrackEnd`] for whoever awaits the [`PlaybackCompletion`] and
//! clears the session entry if it still belongs to that track.

use serenity::model::id::GuildId;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info};

use super::error::{VoiceError, VoiceResult};
use super::registry::{Playback, PlaybackStatus, VoiceSessionRegistry};
use super::source::AudioSource;
use super::transport::VoiceTransport;

/// How a track left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    /// Ran to its natural end.
    Finished,
    /// Skipped, replaced, or lost with the connection.
    Stopped,
}

/// Resolves once the track started by [`PlaybackController::play`] ends.
#[derive(Debug)]
pub struct PlaybackCompletion(oneshot::Receiver<TrackEnd>);

impl Future for PlaybackCompletion {
    type Output = TrackEnd;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0)
            .poll(cx)
            .map(|end| end.unwrap_or(TrackEnd::Stopped))
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Pause,
    Resume,
}

pub struct PlaybackController {
    registry: Arc<VoiceSessionRegistry>,
    transport: Arc<dyn VoiceTransport>,
}

impl PlaybackController {
    pub fn new(registry: Arc<VoiceSessionRegistry>, transport: Arc<dyn VoiceTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Start `source`, stopping the current track first if there is one.
    /// Refused once a leave is pending.
    pub async fn play(&self, guild_id: GuildId, source: AudioSource) -> VoiceResult<PlaybackCompletion> {
        let state = self.registry.guild(guild_id);
        let mut state = state.lock().await;

        // a pending leave means the connection is on its way out
        if state.connection.is_none() || state.leave_pending(Instant::now()) {
            return Err(VoiceError::NotConnected);
        }

        if let Some(previous) = state.playback.take() {
            debug!(
                "Replacing '{}' in guild {}",
                previous.source().describe(),
                guild_id
            );
            previous.halt();
        }

        let started = self.transport.start(guild_id, &source).await?;
        let generation = self.registry.next_generation();
        info!("Now playing '{}' in guild {}", source.describe(), guild_id);
        state.playback = Some(Playback::new(generation, source, started.control));
        drop(state);

        let (tx, rx) = oneshot::channel();
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            // a dropped sender means the transport is gone, which also ends the track
            let _ = started.ended.await;
            let end = Self::settle(&registry, guild_id, generation).await;
            debug!("Track {} in guild {} ended: {:?}", generation, guild_id, end);
            let _ = tx.send(end);
        });

        Ok(PlaybackCompletion(rx))
    }

    /// Clear the session entry if it still belongs to `generation`.
    async fn settle(registry: &VoiceSessionRegistry, guild_id: GuildId, generation: u64) -> TrackEnd {
        let Some(state) = registry.existing(guild_id) else {
            return TrackEnd::Stopped;
        };
        let mut state = state.lock().await;
        let current = state
            .playback
            .as_ref()
            .is_some_and(|playback| playback.generation == generation);
        if current {
            state.playback = None;
            TrackEnd::Finished
        } else {
            TrackEnd::Stopped
        }
    }

    /// Stop the current track. Returns whether anything was playing.
    pub async fn stop(&self, guild_id: GuildId) -> bool {
        let Some(state) = self.registry.existing(guild_id) else {
            return false;
        };
        let playback = state.lock().await.playback.take();
        match playback {
            Some(playback) => {
                info!(
                    "Stopped '{}' in guild {}",
                    playback.source().describe(),
                    guild_id
                );
                playback.halt();
                true
            }
            None => false,
        }
    }

    /// Pause the current track. Pausing a paused track is a no-op.
    pub async fn pause(&self, guild_id: GuildId) -> VoiceResult<PlaybackStatus> {
        self.transition(guild_id, Direction::Pause).await
    }

    /// Resume a paused track. Resuming a playing track is a no-op.
    pub async fn resume(&self, guild_id: GuildId) -> VoiceResult<PlaybackStatus> {
        self.transition(guild_id, Direction::Resume).await
    }

    async fn transition(&self, guild_id: GuildId, direction: Direction) -> VoiceResult<PlaybackStatus> {
        let state = self.registry.existing(guild_id).ok_or(VoiceError::NotPlaying)?;
        let mut state = state.lock().await;
        let playback = state.playback.as_mut().ok_or(VoiceError::NotPlaying)?;

        let target = match direction {
            Direction::Pause => PlaybackStatus::Paused,
            Direction::Resume => PlaybackStatus::Playing,
        };
        if playback.status == target {
            return Ok(target);
        }

        match direction {
            Direction::Pause => playback.control.pause()?,
            Direction::Resume => playback.control.resume()?,
        }
        playback.status = target;
        debug!("Guild {} playback is now {:?}", guild_id, target);
        Ok(target)
    }
}
