use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{CreateEmbed, CreateMessage, ReactionType};
use thiserror::Error;
use tracing::info;

use crate::{CommandResult, Context};

/// Keycap emoji used to number poll options, in order.
pub const OPTION_EMOJIS: [&str; 10] = [
    "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟",
];

const MIN_OPTIONS: usize = 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PollError {
    #[error("You must provide at least 2 options.")]
    TooFewOptions,

    #[error("You can only provide up to 10 options.")]
    TooManyOptions,
}

/// Split `;`-separated options, trimming each and dropping empty ones.
pub fn parse_options(raw: &str) -> Result<Vec<String>, PollError> {
    let options: Vec<String> = raw
        .split(';')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect();

    if options.len() < MIN_OPTIONS {
        return Err(PollError::TooFewOptions);
    }
    if options.len() > OPTION_EMOJIS.len() {
        return Err(PollError::TooManyOptions);
    }
    Ok(options)
}

/// Embed description: one numbered line per option.
pub fn describe_options(options: &[String]) -> String {
    OPTION_EMOJIS
        .iter()
        .zip(options)
        .map(|(emoji, option)| format!("{} {}\n", emoji, option))
        .collect()
}

/// Create a custom poll with multiple options. Use semicolons to separate options.
#[poise::command(slash_command, guild_only, category = "General")]
pub async fn poll(
    ctx: Context<'_>,
    #[description = "The poll question"] question: String,
    #[description = "Options separated by semicolons"] options: String,
) -> CommandResult {
    let options = match parse_options(&options) {
        Ok(options) => options,
        Err(err) => {
            ctx.send(CreateReply::default().content(err.to_string()).ephemeral(true))
                .await?;
            return Ok(());
        }
    };

    let embed = CreateEmbed::new()
        .title(format!("📊 {}", question))
        .description(describe_options(&options))
        .color(0x9b59b6);

    let message = ctx
        .channel_id()
        .send_message(ctx.http(), CreateMessage::new().embed(embed))
        .await?;

    for emoji in OPTION_EMOJIS.iter().take(options.len()) {
        message
            .react(ctx.http(), ReactionType::Unicode(emoji.to_string()))
            .await?;
    }
    info!("Created poll '{}' with {} options", question, options.len());

    ctx.send(CreateReply::default().content("Poll created!").ephemeral(true))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn options_are_trimmed_and_empties_dropped() {
        assert_eq!(
            parse_options(" pizza ;; tacos;  ;sushi ").unwrap(),
            vec!["pizza", "tacos", "sushi"]
        );
    }

    #[test_case("" ; "nothing")]
    #[test_case("only one" ; "single option")]
    #[test_case("one; ;  " ; "blanks do not count")]
    fn too_few_options(raw: &str) {
        assert_eq!(parse_options(raw), Err(PollError::TooFewOptions));
    }

    #[test]
    fn ten_is_the_limit() {
        let ten = (1..=10).map(|i| i.to_string()).collect::<Vec<_>>().join(";");
        assert_eq!(parse_options(&ten).unwrap().len(), 10);

        let eleven = format!("{};11", ten);
        assert_eq!(parse_options(&eleven), Err(PollError::TooManyOptions));
    }

    #[test]
    fn description_numbers_each_option() {
        let options = vec!["Yes".to_string(), "No".to_string()];
        assert_eq!(describe_options(&options), "1️⃣ Yes\n2️⃣ No\n");
    }
}
