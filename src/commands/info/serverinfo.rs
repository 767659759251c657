use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{ChannelType, CreateEmbed};

use super::format_timestamp;
use crate::{CommandResult, Context};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChannelCounts {
    pub text: usize,
    pub voice: usize,
    pub categories: usize,
}

impl ChannelCounts {
    pub fn tally(kinds: impl IntoIterator<Item = ChannelType>) -> Self {
        kinds.into_iter().fold(Self::default(), |mut counts, kind| {
            match kind {
                ChannelType::Text | ChannelType::News => counts.text += 1,
                ChannelType::Voice | ChannelType::Stage => counts.voice += 1,
                ChannelType::Category => counts.categories += 1,
                _ => {}
            }
            counts
        })
    }
}

/// Show information about this server
#[poise::command(slash_command, guild_only, category = "Info")]
pub async fn serverinfo(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    // built in a sync block so the cache guard is gone before any await
    let embed = ctx.cache().guild(guild_id).map(|guild| {
        let channels = ChannelCounts::tally(guild.channels.values().map(|c| c.kind));

        let embed = CreateEmbed::new()
            .title(format!("Server Info - {}", guild.name))
            .field("Server ID", guild.id.to_string(), true)
            .field("Owner", format!("<@{}>", guild.owner_id), true)
            .field("Region", &guild.preferred_locale, true)
            .field("Members", guild.member_count.to_string(), true)
            .field("Roles", guild.roles.len().to_string(), true)
            .field("Text Channels", channels.text.to_string(), true)
            .field("Voice Channels", channels.voice.to_string(), true)
            .field("Categories", channels.categories.to_string(), true)
            .field("Created On", format_timestamp(guild.id.created_at()), true)
            .color(0x2ecc71);
        match guild.icon_url() {
            Some(icon) => embed.thumbnail(icon),
            None => embed,
        }
    });

    let Some(embed) = embed else {
        ctx.say("Failed to find this server in cache.").await?;
        return Ok(());
    };

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tallies_by_kind() {
        let counts = ChannelCounts::tally([
            ChannelType::Text,
            ChannelType::Voice,
            ChannelType::Text,
            ChannelType::Category,
            ChannelType::Stage,
            ChannelType::PublicThread,
        ]);

        assert_eq!(
            counts,
            ChannelCounts {
                text: 2,
                voice: 2,
                categories: 1
            }
        );
    }
}
