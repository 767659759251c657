pub(crate) mod join;
pub(crate) mod leave;
pub(crate) mod muzika;
pub(crate) mod pause;
pub(crate) mod playlocal;
pub(crate) mod replies;
pub(crate) mod resume;
pub(crate) mod skip;

use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId};
use warden::voice::VoiceError;

use crate::Context;

/// Guild the command was invoked in.
pub(crate) fn guild_id(ctx: &Context<'_>) -> Result<GuildId, VoiceError> {
    ctx.guild_id().ok_or(VoiceError::NotInGuild)
}

/// Voice channel the invoking user is sitting in.
pub(crate) fn user_voice_channel(ctx: &Context<'_>, guild_id: GuildId) -> Result<ChannelId, VoiceError> {
    let guild = ctx.cache().guild(guild_id).ok_or(VoiceError::NotInGuild)?;

    guild
        .voice_states
        .get(&ctx.author().id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(VoiceError::UserNotInVoiceChannel)
}
