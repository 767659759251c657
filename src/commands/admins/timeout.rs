use chrono::{DateTime, Duration, Utc};
use poise::{CreateReply, serenity_prelude as serenity};

use super::report;
use crate::{CommandResult, Context, is_admin};

/// Discord refuses timeouts longer than 28 days.
pub const MAX_TIMEOUT_MINUTES: u32 = 28 * 24 * 60;

/// When a timeout of `minutes` starting at `now` runs out.
pub fn timeout_until(now: DateTime<Utc>, minutes: u32) -> Option<serenity::Timestamp> {
    if minutes == 0 || minutes > MAX_TIMEOUT_MINUTES {
        return None;
    }
    let until = now + Duration::minutes(i64::from(minutes));
    serenity::Timestamp::from_unix_timestamp(until.timestamp()).ok()
}

/// Timeout a member
#[poise::command(slash_command, guild_only, check = "is_admin", category = "Admin")]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "The user to timeout"] mut member: serenity::Member,
    #[description = "The duration of the timeout (in minutes)"]
    #[min = 1]
    #[max = 40320]
    minutes: u32,
) -> CommandResult {
    if member.user.id == ctx.author().id {
        ctx.send(
            CreateReply::default()
                .content("You cannot timeout yourself.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let Some(until) = timeout_until(Utc::now(), minutes) else {
        ctx.send(
            CreateReply::default()
                .content(format!(
                    "The timeout must be between 1 and {} minutes.",
                    MAX_TIMEOUT_MINUTES
                ))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    let result = member
        .disable_communication_until_datetime(ctx, until)
        .await;

    report(
        ctx,
        result,
        format!(
            "<@{}> has been timed out for {} minutes.",
            member.user.id, minutes
        ),
        "There was an error applying the timeout.",
    )
    .await
}

/// Remove a member's timeout
#[poise::command(slash_command, guild_only, check = "is_admin", category = "Admin")]
pub async fn remove_timeout(
    ctx: Context<'_>,
    #[description = "Member whose timeout to lift"] mut member: serenity::Member,
) -> CommandResult {
    let result = member.enable_communication(ctx).await;

    report(
        ctx,
        result,
        format!("Timeout removed from {}.", member.user.name),
        "There was an error removing the timeout.",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn adds_minutes_to_now() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let until = timeout_until(now, 10).unwrap();
        assert_eq!(until.unix_timestamp(), 1_700_000_600);
    }

    #[test_case(0 ; "zero")]
    #[test_case(MAX_TIMEOUT_MINUTES + 1 ; "past the cap")]
    fn rejects_out_of_range(minutes: u32) {
        assert!(timeout_until(Utc::now(), minutes).is_none());
    }

    #[test]
    fn accepts_the_cap() {
        assert!(timeout_until(Utc::now(), MAX_TIMEOUT_MINUTES).is_some());
    }
}
