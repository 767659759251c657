//! Works out who forced the bot out of voice and asks them to use `/leave`.
//!
//! Only the single most recent member-disconnect audit entry is read, so an
//! audit write that lands late can be attributed to the wrong drop.

use serenity::async_trait;
use serenity::model::id::{GuildId, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::VoiceResult;

/// Advisory sent to an administrator who disconnected the bot by hand.
pub const ADVISORY_MESSAGE: &str =
    "🚫 Don't use your role to disconnect me. Just use /leave and I will disconnect myself ☺️";

/// A "member disconnected" audit log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectEntry {
    /// The member that was disconnected, when the platform records it.
    pub target_id: Option<UserId>,
    pub actor_id: UserId,
    pub actor_is_admin: bool,
}

/// Read access to the guild's moderation audit trail.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    async fn latest_member_disconnect(&self, guild_id: GuildId) -> VoiceResult<Option<DisconnectEntry>>;
}

/// Direct messages to users.
#[async_trait]
pub trait DirectMessenger: Send + Sync {
    async fn direct_message(&self, user_id: UserId, content: &str) -> VoiceResult<()>;
}

/// What the attributor concluded about a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// The audit log could not be read.
    Unavailable,
    /// No member-disconnect entry exists.
    NoEntry,
    /// The latest entry is about somebody else.
    OtherTarget,
    /// Disconnected by a member without administrator rights.
    NotAdministrator(UserId),
    /// The administrator got the advisory.
    Notified(UserId),
    /// The administrator could not be messaged.
    DeliveryFailed(UserId),
}

pub struct DisconnectAttributor {
    bot_id: UserId,
    audit: Arc<dyn AuditTrail>,
    messenger: Arc<dyn DirectMessenger>,
}

impl DisconnectAttributor {
    pub fn new(bot_id: UserId, audit: Arc<dyn AuditTrail>, messenger: Arc<dyn DirectMessenger>) -> Self {
        Self {
            bot_id,
            audit,
            messenger,
        }
    }

    /// Inspect the audit trail for an involuntary drop in `guild_id`. Never fails;
    /// every problem is logged and folded into the returned [`Attribution`].
    pub async fn attribute(&self, guild_id: GuildId) -> Attribution {
        let entry = match self.audit.latest_member_disconnect(guild_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("No member-disconnect audit entry in guild {}", guild_id);
                return Attribution::NoEntry;
            }
            Err(e) => {
                warn!("Could not read audit log for guild {}: {}", guild_id, e);
                return Attribution::Unavailable;
            }
        };

        if entry.target_id.is_some_and(|target| target != self.bot_id) {
            return Attribution::OtherTarget;
        }

        if !entry.actor_is_admin {
            debug!(
                "Bot was disconnected in guild {} by non-administrator {}",
                guild_id, entry.actor_id
            );
            return Attribution::NotAdministrator(entry.actor_id);
        }

        match self
            .messenger
            .direct_message(entry.actor_id, ADVISORY_MESSAGE)
            .await
        {
            Ok(()) => {
                info!(
                    "Sent leave advisory to administrator {} in guild {}",
                    entry.actor_id, guild_id
                );
                Attribution::Notified(entry.actor_id)
            }
            Err(e) => {
                warn!("Could not DM {} (probably has DMs off): {}", entry.actor_id, e);
                Attribution::DeliveryFailed(entry.actor_id)
            }
        }
    }
}
