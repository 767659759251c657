//! Reacts to the bot's own voice-state changes.
//!
//! A drop (`Some(channel)` → `None`) is either the tail end of a `leave`,
//! recognised by consuming the registry's leave intent, or involuntary. An
//! involuntary drop gets a bounded reconnect to the same channel while the
//! [`DisconnectAttributor`] inspects the audit log on its own task. A `leave`
//! that lands while the reconnect is running wins over it.

use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::attributor::{Attribution, DisconnectAttributor};
use super::error::{VoiceError, VoiceResult};
use super::registry::VoiceSessionRegistry;
use super::transport::VoiceTransport;

/// How hard to try getting back into a channel after an involuntary drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_secs(2),
        }
    }
}

/// What the supervisor did with a voice-state change.
#[derive(Debug)]
pub enum VoiceStateOutcome {
    /// Nothing to do.
    Ignored,
    /// The bot is now in `channel_id`.
    Connected(ChannelId),
    /// Disconnect caused by `leave`; nothing reconnected.
    CleanLeave(ChannelId),
    /// Involuntary drop recovered.
    Reconnected {
        channel_id: ChannelId,
        attribution: JoinHandle<Attribution>,
    },
    /// Involuntary drop whose reconnect was abandoned for a `leave`.
    LeftWhileReconnecting {
        channel_id: ChannelId,
        attribution: JoinHandle<Attribution>,
    },
    /// Involuntary drop that stayed dropped.
    ReconnectFailed {
        channel_id: ChannelId,
        error: VoiceError,
        attribution: JoinHandle<Attribution>,
    },
}

enum Reconnect {
    Restored,
    Abandoned,
}

pub struct ReconnectSupervisor {
    registry: Arc<VoiceSessionRegistry>,
    transport: Arc<dyn VoiceTransport>,
    attributor: Arc<DisconnectAttributor>,
    policy: ReconnectPolicy,
}

impl ReconnectSupervisor {
    pub fn new(
        registry: Arc<VoiceSessionRegistry>,
        transport: Arc<dyn VoiceTransport>,
        attributor: Arc<DisconnectAttributor>,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            registry,
            transport,
            attributor,
            policy,
        }
    }

    /// Handle a change of the bot's voice channel in `guild_id`.
    pub async fn handle_voice_state(
        &self,
        guild_id: GuildId,
        before: Option<ChannelId>,
        after: Option<ChannelId>,
    ) -> VoiceStateOutcome {
        match (before, after) {
            (_, Some(channel_id)) => {
                self.registry.set_connected(guild_id, channel_id).await;
                VoiceStateOutcome::Connected(channel_id)
            }
            (Some(channel_id), None) => self.handle_drop(guild_id, channel_id).await,
            (None, None) => {
                // Nothing was connected, so no disconnect event is coming for
                // any pending leave either.
                if self.registry.take_manual_disconnect(guild_id).await {
                    debug!("Discarded leave intent for unconnected guild {}", guild_id);
                }
                VoiceStateOutcome::Ignored
            }
        }
    }

    async fn handle_drop(&self, guild_id: GuildId, channel_id: ChannelId) -> VoiceStateOutcome {
        let manual = {
            let state = self.registry.guild(guild_id);
            let mut state = state.lock().await;
            let manual = state.take_leave(Instant::now());
            if let Some(playback) = state.disconnect() {
                playback.halt();
            }
            state.reconnecting = !manual;
            manual
        };

        if manual {
            info!("Left channel {} in guild {} on request", channel_id, guild_id);
            return VoiceStateOutcome::CleanLeave(channel_id);
        }

        warn!(
            "Involuntarily disconnected from channel {} in guild {}",
            channel_id, guild_id
        );

        let attribution = {
            let attributor = Arc::clone(&self.attributor);
            tokio::spawn(async move { attributor.attribute(guild_id).await })
        };

        match self.reconnect(guild_id, channel_id).await {
            Ok(Reconnect::Restored) => {
                info!("Reconnected to channel {} in guild {}", channel_id, guild_id);
                VoiceStateOutcome::Reconnected {
                    channel_id,
                    attribution,
                }
            }
            Ok(Reconnect::Abandoned) => {
                info!(
                    "Gave up reconnecting to channel {} in guild {} for a leave",
                    channel_id, guild_id
                );
                VoiceStateOutcome::LeftWhileReconnecting {
                    channel_id,
                    attribution,
                }
            }
            Err(error) => {
                error!(
                    "Failed to reconnect to channel {} in guild {}: {}",
                    channel_id, guild_id, error
                );
                VoiceStateOutcome::ReconnectFailed {
                    channel_id,
                    error,
                    attribution,
                }
            }
        }
    }

    async fn reconnect(&self, guild_id: GuildId, channel_id: ChannelId) -> VoiceResult<Reconnect> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if self.registry.cancel_reconnect_on_leave(guild_id).await {
                return Ok(Reconnect::Abandoned);
            }

            match self.transport.connect(guild_id, channel_id).await {
                Ok(()) => {
                    if self.registry.complete_reconnect(guild_id, channel_id).await {
                        return Ok(Reconnect::Restored);
                    }
                    // the pending intent marks the resulting disconnect as a clean leave
                    match self.transport.disconnect(guild_id).await {
                        Ok(()) | Err(VoiceError::NotConnected) => {}
                        Err(e) => {
                            warn!("Failed to leave after reconnect in guild {}: {}", guild_id, e);
                            self.registry.set_manual_disconnect(guild_id, false).await;
                        }
                    }
                    return Ok(Reconnect::Abandoned);
                }
                Err(e) => {
                    debug!(
                        "Reconnect attempt {}/{} for guild {} failed: {}",
                        attempt, attempts, guild_id, e
                    );
                    last_error = Some(e);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.policy.backoff).await;
            }
        }

        self.registry.abandon_reconnect(guild_id).await;
        Err(VoiceError::ReconnectFailed(
            last_error.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }
}
