use tracing::{error, info};

use crate::{
    helpers::guild_id,
    santa::ENTRY_EMOJI,
    structs::{Context, Error},
};

/// Post the sign-up message for a new secret santa round
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn announce(
    ctx: Context<'_>,
    #[description = "Extra text for the sign-up message (budget, deadline, ...)"]
    details: Option<String>,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;

    let mut content = format!(
        ":christmas_tree: **Secret santa is coming!**\nReact with {} to this message to join.",
        ENTRY_EMOJI
    );
    if let Some(details) = details {
        content += format!("\n\n{details}").as_str();
    }

    let reply = ctx.say(content).await?;
    let message = reply.message().await?;
    message.react(ctx.serenity_context(), ENTRY_EMOJI).await?;

    match ctx
        .data()
        .query_handler
        .set_announcement(guild_id, message.channel_id, message.id)
        .await
    {
        Ok(()) => info!(guild_id = guild_id.0, message_id = message.id.0, "Secret santa announced"),
        Err(err) => {
            error!(guild_id = guild_id.0, "Could not store santa announcement: {err}");
            ctx.say(ctx.data().translator.tr("error-generic")).await?;
        }
    }

    Ok(())
}
