use warden::voice::VoiceError;

use super::{guild_id, replies};
use crate::{CommandResult, Context};

/// Skip the currently playing track
#[poise::command(slash_command, guild_only, category = "Voice")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let guild_id = guild_id(&ctx)?;

    if ctx.data().voice.playback.stop(guild_id).await {
        ctx.send(replies::skipped()).await?;
    } else {
        ctx.send(replies::error(&VoiceError::NotPlaying)).await?;
    }

    Ok(())
}
