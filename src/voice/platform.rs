//! Serenity-backed audit trail and direct messaging.

use serenity::all::{
    Cache, CreateMessage, GuildId, Http, Member, Permissions, Role, RoleId, UserId,
};
use serenity::async_trait;
use serenity::model::guild::audit_log::{Action, MemberAction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::attributor::{AuditTrail, DirectMessenger, DisconnectEntry};
use super::error::{VoiceError, VoiceResult};

pub struct SerenityPlatform {
    cache: Arc<Cache>,
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(cache: Arc<Cache>, http: Arc<Http>) -> Self {
        Self { cache, http }
    }

    async fn is_administrator(&self, guild_id: GuildId, user_id: UserId) -> VoiceResult<bool> {
        let member = guild_id
            .member((&self.cache, self.http.as_ref()), user_id)
            .await
            .map_err(|e| VoiceError::AuditLogUnavailable(format!("Failed to fetch member {}: {}", user_id, e)))?;

        let cached = self
            .cache
            .guild(guild_id)
            .map(|guild| member_is_admin(guild.owner_id, &guild.roles, &member));
        if let Some(is_admin) = cached {
            return Ok(is_admin);
        }

        let guild = guild_id
            .to_partial_guild((&self.cache, self.http.as_ref()))
            .await
            .map_err(|e| VoiceError::AuditLogUnavailable(e.to_string()))?;
        Ok(member_is_admin(guild.owner_id, &guild.roles, &member))
    }
}

/// The owner and anyone holding a role with ADMINISTRATOR count as administrators.
pub fn member_is_admin(owner_id: UserId, roles: &HashMap<RoleId, Role>, member: &Member) -> bool {
    member.user.id == owner_id
        || roles_grant_admin(member.guild_id, &member.roles, |role_id| {
            roles.get(role_id).map(|role| role.permissions)
        })
}

/// `@everyone` shares the guild's id and is never listed among a member's
/// roles, but its permissions apply to every member.
fn roles_grant_admin(
    guild_id: GuildId,
    member_roles: &[RoleId],
    permissions: impl Fn(&RoleId) -> Option<Permissions>,
) -> bool {
    let everyone = RoleId::new(guild_id.get());
    std::iter::once(&everyone)
        .chain(member_roles)
        .any(|role_id| permissions(role_id).is_some_and(|p| p.contains(Permissions::ADMINISTRATOR)))
}

#[async_trait]
impl AuditTrail for SerenityPlatform {
    async fn latest_member_disconnect(&self, guild_id: GuildId) -> VoiceResult<Option<DisconnectEntry>> {
        let logs = guild_id
            .audit_logs(
                &self.http,
                Some(Action::Member(MemberAction::MemberDisconnect)),
                None,
                None,
                Some(1),
            )
            .await
            .map_err(|e| VoiceError::AuditLogUnavailable(e.to_string()))?;

        let Some(entry) = logs.entries.into_iter().next() else {
            return Ok(None);
        };
        debug!("Latest member-disconnect entry in guild {}: {:?}", guild_id, entry.id);

        let actor_is_admin = self.is_administrator(guild_id, entry.user_id).await?;

        Ok(Some(DisconnectEntry {
            target_id: entry.target_id.map(|target| UserId::new(target.get())),
            actor_id: entry.user_id,
            actor_is_admin,
        }))
    }
}

#[async_trait]
impl DirectMessenger for SerenityPlatform {
    async fn direct_message(&self, user_id: UserId, content: &str) -> VoiceResult<()> {
        user_id
            .direct_message(
                (&self.cache, self.http.as_ref()),
                CreateMessage::new().content(content),
            )
            .await
            .map(|_| ())
            .map_err(|e| VoiceError::NotificationDeliveryFailed(e.to_string()))
    }
}
