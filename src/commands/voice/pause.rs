use super::{guild_id, replies};
use crate::{CommandResult, Context};

/// Pause the current track
#[poise::command(slash_command, guild_only, category = "Voice")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(&ctx)?;

    match ctx.data().voice.playback.pause(guild_id).await {
        Ok(_) => ctx.send(replies::paused()).await?,
        Err(err) => ctx.send(replies::error(&err)).await?,
    };

    Ok(())
}
