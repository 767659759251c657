pub(crate) mod moderation;
pub(crate) mod mute;
pub(crate) mod timeout;

use poise::{CreateReply, serenity_prelude as serenity};
use tracing::warn;

use crate::{CommandResult, Context};

/// Reply with `success` when the moderation call went through, otherwise log
/// the failure and tell the invoker privately.
pub(crate) async fn report(
    ctx: Context<'_>,
    result: serenity::Result<()>,
    success: String,
    failure: &str,
) -> CommandResult {
    match result {
        Ok(()) => {
            ctx.say(success).await?;
        }
        Err(why) => {
            warn!("'{}' failed: {:?}", ctx.command().name, why);
            ctx.send(CreateReply::default().content(failure).ephemeral(true))
                .await?;
        }
    }
    Ok(())
}

pub(crate) fn reason_text(reason: Option<&str>) -> &str {
    reason.unwrap_or("None")
}
