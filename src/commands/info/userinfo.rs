use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{CreateEmbed, Member};

use super::format_timestamp;
use crate::{CommandResult, Context};

/// Show information about a member
#[poise::command(slash_command, guild_only, category = "Info")]
pub async fn userinfo(
    ctx: Context<'_>,
    #[description = "Member to describe"] member: Member,
) -> CommandResult {
    // (top role, mentions) from the cache; the guard must not live across an await
    let (top_role, roles) = {
        let guild = ctx.cache().guild(member.guild_id);
        let mut roles: Vec<_> = member
            .roles
            .iter()
            .filter_map(|id| guild.as_ref().and_then(|g| g.roles.get(id)))
            .collect();
        roles.sort_by(|a, b| b.position.cmp(&a.position));

        let top_role = roles
            .first()
            .map(|role| format!("<@&{}>", role.id))
            .unwrap_or_else(|| "None".to_string());
        let mentions = roles
            .iter()
            .map(|role| format!("<@&{}>", role.id))
            .collect::<Vec<_>>()
            .join(", ");
        (top_role, mentions)
    };

    let discriminator = member
        .user
        .discriminator
        .map(|d| format!("{:04}", d))
        .unwrap_or_else(|| "None".to_string());

    let embed = CreateEmbed::new()
        .title(format!("User Info - {}", member.user.name))
        .thumbnail(member.face())
        .field("Username", &member.user.name, true)
        .field("Discriminator", discriminator, true)
        .field("User ID", member.user.id.to_string(), true)
        .field("Nickname", member.nick.as_deref().unwrap_or("None"), true)
        .field("Top Role", top_role, true)
        .field("Bot?", member.user.bot.to_string(), true)
        .field(
            "Joined Server",
            member
                .joined_at
                .map(format_timestamp)
                .unwrap_or_else(|| "Unknown".to_string()),
            true,
        )
        .field(
            "Account Created",
            format_timestamp(member.user.id.created_at()),
            true,
        )
        .field(
            "Roles",
            if roles.is_empty() { "None".to_string() } else { roles },
            false,
        )
        .color(0x3498db);

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
