use crate::structs::{Context, Error};

/// Check that the bot is alive and how far away the gateway is
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    ctx.say(format!("Pong! Gateway latency: {}ms", latency.as_millis()))
        .await?;

    Ok(())
}
