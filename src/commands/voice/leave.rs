use super::{guild_id, replies};
use crate::{CommandResult, Context};

/// Leave the voice channel
#[poise::command(slash_command, guild_only, category = "Voice")]
pub async fn leave(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(&ctx)?;

    match ctx.data().voice.leave(guild_id).await {
        Ok(()) => ctx.send(replies::left()).await?,
        Err(err) => ctx.send(replies::error(&err)).await?,
    };

    Ok(())
}
