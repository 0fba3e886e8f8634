use super::{describe_report, report_failure};
use crate::{
    helpers::guild_id,
    structs::{Context, Error},
};

/// Remind participants who haven't shared a shipping address yet
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn nudge(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    let guild_id = guild_id(ctx)?;

    match ctx.data().santa.nudge(guild_id).await {
        Ok(report) if report.delivered == 0 && report.failed.is_empty() => {
            ctx.say("Everyone has shared an address already").await?;
        }
        Ok(report) => {
            ctx.say(describe_report("Sent", &report)).await?;
        }
        Err(err) => report_failure(ctx, err).await?,
    }

    Ok(())
}
