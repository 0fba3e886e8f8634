use tracing::info;

use super::{describe_report, report_failure};
use crate::{
    helpers::guild_id,
    santa::AddressOutcome,
    structs::{Context, Error},
};

const MAX_ADDRESS_LENGTH: usize = 500;

/// Set or change the address your gift gets shipped to
#[poise::command(slash_command, guild_only, ephemeral)]
pub async fn address(
    ctx: Context<'_>,
    #[description = "Your full shipping address"] address: String,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let user_id = ctx.author().id;
    let address = address.trim();

    if address.is_empty() {
        ctx.say("The address can't be empty").await?;
        return Ok(());
    }
    if address.chars().count() > MAX_ADDRESS_LENGTH {
        ctx.say(format!(
            "That address is too long, keep it under {MAX_ADDRESS_LENGTH} characters"
        ))
        .await?;
        return Ok(());
    }

    ctx.defer_ephemeral().await?;

    match ctx.data().santa.set_address(guild_id, user_id, address).await {
        Ok(AddressOutcome::Unchanged) => {
            ctx.say("That's already your address, nothing changed").await?;
        }
        Ok(AddressOutcome::Updated(report)) => {
            info!(guild_id = guild_id.0, user_id = user_id.0, "Shipping address updated");
            let mut response =
                "Address saved! Your invitation and your santa's have been updated.".to_owned();
            if !report.failed.is_empty() || !report.missing.is_empty() {
                response += "\n";
                response += describe_report("Delivered", &report).as_str();
            }
            ctx.say(response).await?;
        }
        Err(err) => report_failure(ctx, err).await?,
    }

    Ok(())
}
