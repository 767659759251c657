use poise::serenity_prelude as serenity;

use super::{guild_id, replies};
use crate::{CommandResult, Context};

/// Join a voice channel
#[poise::command(slash_command, guild_only, category = "Voice")]
pub async fn join(
    ctx: Context<'_>,
    #[description = "Voice channel to join"]
    #[channel_types("Voice")]
    channel: serenity::GuildChannel,
) -> CommandResult {
    let guild_id = guild_id(&ctx)?;

    match ctx.data().voice.join(guild_id, channel.id).await {
        Ok(()) => ctx.send(replies::joined(&channel.name)).await?,
        Err(err) => ctx.send(replies::error(&err)).await?,
    };

    Ok(())
}
