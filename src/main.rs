use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use warden::config::Config;
use warden::voice::VoiceService;
use warden::voice::platform::{SerenityPlatform, member_is_admin};
use warden::voice::songbird_transport::SongbirdTransport;

mod commands;
mod events;

use commands::{
    admins::{moderation::*, mute::*, timeout::*},
    general::{ping::*, poll::*},
    info::{serverinfo::*, userinfo::*},
    voice::{join::*, leave::*, muzika::*, pause::*, playlocal::*, resume::*, skip::*},
};

type Error = warden::Error;
type Context<'a> = poise::Context<'a, Data, Error>;
type CommandResult = Result<(), Error>;

/// User data shared by every command invocation and event.
pub struct Data {
    pub voice: Arc<VoiceService>,
}

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

/// Check for administrator-only commands: the interaction's resolved
/// permissions, falling back to the member's cached roles.
async fn is_admin(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };
    let Some(member) = ctx.author_member().await else {
        return Ok(false);
    };

    if member.permissions.is_some_and(|p| p.administrator()) {
        return Ok(true);
    }

    Ok(ctx
        .cache()
        .guild(guild_id)
        .is_some_and(|guild| member_is_admin(guild.owner_id, &guild.roles, &member)))
}

/// Converts every framework error into a log line plus, where possible, a
/// reply to the invoking user.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {}", ctx.command().name, error);
            let reply = poise::CreateReply::default()
                .content(format!("There was an error running `/{}`.", ctx.command().name))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                warn!("Failed to report command error: {}", e);
            }
        }
        poise::FrameworkError::CommandCheckFailed { ctx, error, .. } => {
            if let Some(error) = error {
                warn!("Check for '{}' failed: {}", ctx.command().name, error);
            }
            let reply = poise::CreateReply::default()
                .content("Only administrators can use this command.")
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                warn!("Failed to report check failure: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warden=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::load()?;
    let token = config.token()?.to_string();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // General commands
        ping(),
        poll(),
        // Info commands
        userinfo(),
        serverinfo(),
        // Moderation commands
        kick(),
        ban(),
        unban(),
        timeout(),
        remove_timeout(),
        chat_mute(),
        chat_unmute(),
        voice_mute(),
        voice_unmute(),
        // Voice commands
        join(),
        leave(),
        playlocal(),
        muzika(),
        skip(),
        pause(),
        resume(),
    ];

    let songbird = Songbird::serenity();
    let voice_manager = Arc::clone(&songbird);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Synced {} commands", framework.options().commands.len());

                let platform = Arc::new(SerenityPlatform::new(
                    Arc::clone(&ctx.cache),
                    Arc::clone(&ctx.http),
                ));
                let transport = Arc::new(SongbirdTransport::new(
                    voice_manager,
                    reqwest::Client::new(),
                ));
                let voice = VoiceService::new(
                    &config,
                    ready.user.id,
                    transport,
                    platform.clone(),
                    platform,
                );

                Ok(Data {
                    voice: Arc::new(voice),
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .register_songbird_with(songbird)
        .await?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    client.start().await.map_err(Into::into)
}
