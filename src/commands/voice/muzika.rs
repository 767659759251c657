use tracing::{error, info};

use super::{guild_id, replies, user_voice_channel};
use crate::{CommandResult, Context};

/// Play music from a URL (e.g. a YouTube link)
#[poise::command(slash_command, guild_only, category = "Voice")]
pub async fn muzika(
    ctx: Context<'_>,
    #[description = "The URL of the music to play (e.g. YouTube link)"] url: String,
) -> CommandResult {
    let guild_id = guild_id(&ctx)?;
    info!("Received muzika command with URL: {}", url);

    let channel_id = match user_voice_channel(&ctx, guild_id) {
        Ok(channel_id) => channel_id,
        Err(err) => {
            ctx.send(replies::error(&err)).await?;
            return Ok(());
        }
    };

    // Resolving the stream can take a while
    ctx.defer().await?;

    let voice = &ctx.data().voice;
    match voice.play_remote(guild_id, channel_id, &url).await {
        Ok((source, completion)) => {
            ctx.send(replies::now_playing(&source)).await?;
            voice.leave_when_finished(guild_id, completion);
        }
        Err(err) => {
            error!("Error in muzika command: {}", err);
            ctx.send(replies::error(&err)).await?;
        }
    }

    Ok(())
}
