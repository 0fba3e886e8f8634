use poise::serenity_prelude::Mention;

use super::report_failure;
use crate::{
    helpers::guild_id,
    structs::{Context, Error},
};

/// Show who you are gifting this round
#[poise::command(slash_command, guild_only, ephemeral, rename = "match")]
pub async fn recipient(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let data = ctx.data();

    let recipient = match data.santa.match_of(guild_id, ctx.author().id).await {
        Ok(recipient) => recipient,
        Err(err) => return report_failure(ctx, err).await,
    };

    let address = match &recipient.address {
        Some(address) => data
            .translator
            .format("santa-recipient-address", &[("address", address.as_str())]),
        None => data.translator.tr("santa-recipient-address-missing").to_owned(),
    };

    ctx.say(format!(
        "You are gifting **{}** ({})\n{}",
        recipient.display_name,
        Mention::User(recipient.user_id),
        address
    ))
    .await?;
    Ok(())
}
