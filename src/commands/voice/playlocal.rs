use tracing::info;

use super::{guild_id, replies};
use crate::{CommandResult, Context};

/// Play an audio file from the bot's audio directory
#[poise::command(slash_command, guild_only, category = "Voice")]
pub async fn playlocal(
    ctx: Context<'_>,
    #[description = "Name of the file to play"] filename: String,
) -> CommandResult {
    let guild_id = guild_id(&ctx)?;
    info!("Received playlocal command for file: {}", filename);

    match ctx.data().voice.play_local(guild_id, &filename).await {
        // skip-on-replace, nobody needs to wait for the end of a local file
        Ok((source, _completion)) => ctx.send(replies::now_playing(&source)).await?,
        Err(err) => ctx.send(replies::error(&err)).await?,
    };

    Ok(())
}
