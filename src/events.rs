use poise::serenity_prelude as serenity;
use serenity::{FullEvent, VoiceState};
use tracing::{debug, info};

use warden::voice::VoiceStateOutcome;

use crate::{Data, Error};

/// Gateway events the framework passes through to us.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        FullEvent::VoiceStateUpdate { old, new } => {
            bot_voice_state_update(ctx, data, old.as_ref(), new).await;
        }
        FullEvent::GuildDelete { incomplete, .. } if !incomplete.unavailable => {
            info!("Removed from guild {}", incomplete.id);
            data.voice.forget_guild(incomplete.id).await;
        }
        _ => {}
    }
    Ok(())
}

/// Feed the bot's own voice-state changes to the reconnect supervisor.
async fn bot_voice_state_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&VoiceState>,
    new: &VoiceState,
) {
    let bot_id = ctx.cache.current_user().id;
    if new.user_id != bot_id {
        return;
    }
    let Some(guild_id) = new.guild_id else {
        return;
    };

    // The cache only knows the previous channel if it saw it; the registry
    // knows where we connected ourselves.
    let before = match old.and_then(|state| state.channel_id) {
        Some(channel_id) => Some(channel_id),
        None => data
            .voice
            .registry
            .connection(guild_id)
            .await
            .map(|conn| conn.channel_id),
    };

    let outcome = data
        .voice
        .supervisor
        .handle_voice_state(guild_id, before, new.channel_id)
        .await;

    match outcome {
        VoiceStateOutcome::Ignored | VoiceStateOutcome::Connected(_) => {
            debug!("Voice state in guild {}: {:?}", guild_id, outcome);
        }
        VoiceStateOutcome::CleanLeave(channel_id) => {
            debug!("Clean leave from {} in guild {}", channel_id, guild_id);
        }
        // attribution runs on its own task and logs its result
        VoiceStateOutcome::Reconnected { .. }
        | VoiceStateOutcome::LeftWhileReconnecting { .. }
        | VoiceStateOutcome::ReconnectFailed { .. } => {}
    }
}
