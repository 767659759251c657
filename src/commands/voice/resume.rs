use super::{guild_id, replies};
use crate::{CommandResult, Context};

/// Resume a paused track
#[poise::command(slash_command, guild_only, category = "Voice")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(&ctx)?;

    match ctx.data().voice.playback.resume(guild_id).await {
        Ok(_) => ctx.send(replies::resumed()).await?,
        Err(err) => ctx.send(replies::error(&err)).await?,
    };

    Ok(())
}
