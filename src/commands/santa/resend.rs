use super::{describe_report, report_failure};
use crate::{
    helpers::guild_id,
    structs::{Context, Error},
};

/// Refresh every invitation of the current round in place
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn resend(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    let guild_id = guild_id(ctx)?;

    match ctx.data().santa.resend_invitations(guild_id).await {
        Ok(report) => {
            ctx.say(describe_report("Updated", &report)).await?;
        }
        Err(err) => report_failure(ctx, err).await?,
    }

    Ok(())
}
