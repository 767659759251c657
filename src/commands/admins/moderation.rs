use crate::{CommandResult, Context, is_admin};
use poise::serenity_prelude as serenity;

use super::{reason_text, report};

/// Kick a member from the server
#[poise::command(slash_command, guild_only, check = "is_admin", category = "Admin")]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: serenity::Member,
    #[description = "Reason for the kick"] reason: Option<String>,
) -> CommandResult {
    let result = match reason.as_deref() {
        Some(reason) => {
            member
                .guild_id
                .kick_with_reason(ctx.http(), member.user.id, reason)
                .await
        }
        None => member.guild_id.kick(ctx.http(), member.user.id).await,
    };

    report(
        ctx,
        result,
        format!(
            "{} has been kicked. Reason: {}",
            member.user.name,
            reason_text(reason.as_deref())
        ),
        "Failed to kick that member.",
    )
    .await
}

/// Ban a member from the server
#[poise::command(slash_command, guild_only, check = "is_admin", category = "Admin")]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Member to ban"] member: serenity::Member,
    #[description = "Reason for the ban"] reason: Option<String>,
) -> CommandResult {
    let result = match reason.as_deref() {
        Some(reason) => {
            member
                .guild_id
                .ban_with_reason(ctx.http(), member.user.id, 0, reason)
                .await
        }
        None => member.guild_id.ban(ctx.http(), member.user.id, 0).await,
    };

    report(
        ctx,
        result,
        format!(
            "{} has been banned. Reason: {}",
            member.user.name,
            reason_text(reason.as_deref())
        ),
        "Failed to ban that member.",
    )
    .await
}

/// Lift a ban
#[poise::command(slash_command, guild_only, check = "is_admin", category = "Admin")]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "User (or user ID) to unban"] user: serenity::User,
) -> CommandResult {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let result = guild_id.unban(ctx.http(), user.id).await;

    report(
        ctx,
        result,
        format!("{} has been unbanned.", user.name),
        "Failed to unban that user.",
    )
    .await
}
