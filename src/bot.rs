use std::{sync::Arc, time::Instant};

use poise::serenity_prelude::{GatewayIntents, GuildId};
use tokio::sync::watch;
use tracing::{error, info};

use crate::{
    commands::get_commands,
    config::Config,
    cron::bday_crunching,
    discord::DiscordHttp,
    i18n::Translator,
    persistence::{self, spawn_query_handler},
    santa::SecretSanta,
    structs::{Data, Error},
};

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx } => {
            error!(command = %ctx.command().qualified_name, "Command failed: {error}");
            let message = ctx.data().translator.tr("error-generic").to_owned();
            if let Err(err) = ctx.say(message).await {
                error!("Could not report command failure: {err}");
            }
        }
        other => {
            if let Err(err) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {err}");
            }
        }
    }
}

/// Resolves once `/shutdown` flips the flag or the sender is gone.
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

pub async fn start_bot(config: Config) -> anyhow::Result<()> {
    let pool = persistence::connect(&config.database_url).await?;
    let query_handler = spawn_query_handler(pool);
    let translator = Arc::new(Translator::load()?);

    let (shutdown, cron_shutdown) = watch::channel(false);
    let main_shutdown = shutdown.subscribe();
    let register_in = config.register_in;
    let main_query_handler = query_handler.clone();

    let framework_builder = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .token(config.token)
        .intents(GatewayIntents::empty())
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);

                let commands = &framework.options().commands;
                match register_in {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(ctx, commands, GuildId(guild_id))
                            .await?;
                        info!(guild_id, "Registered commands in development guild");
                    }
                    None => poise::builtins::register_globally(ctx, commands).await?,
                }

                tokio::spawn(bday_crunching(
                    Arc::clone(&ctx.http),
                    query_handler.clone(),
                    Arc::clone(&translator),
                    cron_shutdown,
                ));

                let discord = DiscordHttp::new(Arc::clone(&ctx.http));
                let santa = SecretSanta::new(
                    Arc::new(query_handler.clone()),
                    Arc::new(discord.clone()),
                    Arc::clone(&translator),
                );

                Ok(Data {
                    query_handler,
                    santa,
                    discord,
                    translator,
                    shutdown,
                    started: Instant::now(),
                })
            })
        });

    let framework = framework_builder.build().await?;

    tokio::select! {
        result = framework.start() => result?,
        _ = shutdown_requested(main_shutdown) => info!("Shutdown requested"),
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    if main_query_handler.shutdown().is_err() {
        info!("Query handler already stopped");
    }
    Ok(())
}
