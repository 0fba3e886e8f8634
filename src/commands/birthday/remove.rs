use tracing::error;

use crate::{
    helpers::guild_id,
    structs::{Context, Error},
};

/// Forget your birthday on this server
#[poise::command(slash_command, guild_only, ephemeral)]
pub async fn remove(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let user_id = ctx.author().id;

    match ctx
        .data()
        .query_handler
        .remove_birthday(guild_id, user_id)
        .await
    {
        Ok(true) => ctx.say("Birthday removed successfully").await?,
        Ok(false) => ctx.say("You don't have a birthday set here").await?,
        Err(err) => {
            error!(guild_id = guild_id.0, user_id = user_id.0, "Could not remove birthday: {err}");
            ctx.say("Removing failed: Data store returned error").await?
        }
    };

    Ok(())
}
