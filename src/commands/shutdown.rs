use tracing::info;

use crate::structs::{Context, Error};

/// Shut down the bot
#[poise::command(slash_command, owners_only)]
pub async fn shutdown(ctx: Context<'_>) -> Result<(), Error> {
    info!(user_id = ctx.author().id.0, "Shutdown requested");

    match ctx.data().shutdown.send(true) {
        Ok(_) => ctx.say("Shutting down...").await?,
        Err(_) => ctx.say("Failed to initiate shutdown").await?,
    };

    Ok(())
}
