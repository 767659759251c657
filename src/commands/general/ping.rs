use poise::CreateReply;
use std::time::Duration;

use crate::{CommandResult, Context};

/// Ping the bot to check its latency
#[poise::command(slash_command, category = "General")]
pub async fn ping(ctx: Context<'_>) -> CommandResult {
    let latency = match shard_latency(&ctx).await {
        Some(latency) => format!("{}ms", latency.as_millis()),
        // the first heartbeat hasn't been acknowledged yet
        None => "unknown".to_string(),
    };

    ctx.send(CreateReply::default().content(format!("🏓 Pong! Latency: {}", latency)))
        .await?;

    Ok(())
}

/// Heartbeat latency of the shard this command arrived on.
async fn shard_latency(ctx: &Context<'_>) -> Option<Duration> {
    let shard_manager = ctx.framework().shard_manager().clone();
    let runners = shard_manager.runners.lock().await;
    let runner = runners.get(&ctx.serenity_context().shard_id)?;
    runner.latency
}
