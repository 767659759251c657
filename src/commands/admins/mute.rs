use poise::serenity_prelude as serenity;
use serenity::all::{
    ChannelId, ChannelType, EditMember, PermissionOverwrite, PermissionOverwriteType, Permissions,
};

use super::report;
use crate::{CommandResult, Context, is_admin};

/// Text channels of the invoking guild, read from the cache.
fn text_channels(ctx: &Context<'_>) -> Vec<ChannelId> {
    let Some(guild_id) = ctx.guild_id() else {
        return Vec::new();
    };
    ctx.cache()
        .guild(guild_id)
        .map(|guild| {
            guild
                .channels
                .values()
                .filter(|channel| channel.kind == ChannelType::Text)
                .map(|channel| channel.id)
                .collect()
        })
        .unwrap_or_default()
}

/// Deny-send overwrite for one member.
pub fn chat_mute_overwrite(user_id: serenity::UserId) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: Permissions::empty(),
        deny: Permissions::SEND_MESSAGES,
        kind: PermissionOverwriteType::Member(user_id),
    }
}

/// Stop a member from sending messages in every text channel
#[poise::command(slash_command, guild_only, check = "is_admin", category = "Admin")]
pub async fn chat_mute(
    ctx: Context<'_>,
    #[description = "Member to mute"] member: serenity::Member,
) -> CommandResult {
    let mut result = Ok(());
    for channel_id in text_channels(&ctx) {
        result = channel_id
            .create_permission(ctx.http(), chat_mute_overwrite(member.user.id))
            .await;
        if result.is_err() {
            break;
        }
    }

    report(
        ctx,
        result,
        format!("{} has been chat muted.", member.user.name),
        "Failed to chat mute that member.",
    )
    .await
}

/// Remove a member's chat mute
#[poise::command(slash_command, guild_only, check = "is_admin", category = "Admin")]
pub async fn chat_unmute(
    ctx: Context<'_>,
    #[description = "Member to unmute"] member: serenity::Member,
) -> CommandResult {
    let mut result = Ok(());
    for channel_id in text_channels(&ctx) {
        result = channel_id
            .delete_permission(ctx.http(), PermissionOverwriteType::Member(member.user.id))
            .await;
        if result.is_err() {
            break;
        }
    }

    report(
        ctx,
        result,
        format!("{} has been chat unmuted.", member.user.name),
        "Failed to chat unmute that member.",
    )
    .await
}

/// Server-mute a member in voice
#[poise::command(slash_command, guild_only, check = "is_admin", category = "Admin")]
pub async fn voice_mute(
    ctx: Context<'_>,
    #[description = "Member to mute"] member: serenity::Member,
) -> CommandResult {
    let result = member
        .guild_id
        .edit_member(ctx, member.user.id, EditMember::new().mute(true))
        .await
        .map(|_| ());

    report(
        ctx,
        result,
        format!("{} has been voice muted.", member.user.name),
        "Failed to voice mute that member.",
    )
    .await
}

/// Lift a member's voice mute
#[poise::command(slash_command, guild_only, check = "is_admin", category = "Admin")]
pub async fn voice_unmute(
    ctx: Context<'_>,
    #[description = "Member to unmute"] member: serenity::Member,
) -> CommandResult {
    let result = member
        .guild_id
        .edit_member(ctx, member.user.id, EditMember::new().mute(false))
        .await
        .map(|_| ());

    report(
        ctx,
        result,
        format!("{} has been voice unmuted.", member.user.name),
        "Failed to voice unmute that member.",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_denies_sending_only() {
        let user_id = serenity::UserId::new(42);
        let overwrite = chat_mute_overwrite(user_id);

        assert_eq!(overwrite.deny, Permissions::SEND_MESSAGES);
        assert!(overwrite.allow.is_empty());
        assert_eq!(overwrite.kind, PermissionOverwriteType::Member(user_id));
    }
}
