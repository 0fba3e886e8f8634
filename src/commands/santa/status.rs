use super::{mentions, report_failure};
use crate::{
    helpers::guild_id,
    structs::{Context, Error},
};

/// Show how the current round is going
#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;

    let pairing = match ctx.data().santa.pairing(guild_id).await {
        Ok(pairing) => pairing,
        Err(err) => return report_failure(ctx, err).await,
    };

    let waiting: Vec<_> = pairing
        .participants()
        .filter(|participant| participant.address.is_none())
        .map(|participant| participant.user_id)
        .collect();
    let uninvited: Vec<_> = pairing
        .participants()
        .filter(|participant| participant.invitation.is_none())
        .map(|participant| participant.user_id)
        .collect();

    let mut response = format!(
        "{} participants, {} shared a shipping address.",
        pairing.len(),
        pairing.len() - waiting.len()
    );
    if !waiting.is_empty() {
        response += format!("\nStill waiting on: {}", mentions(&waiting)).as_str();
    }
    if !uninvited.is_empty() {
        response += format!("\nNo invitation delivered to: {}", mentions(&uninvited)).as_str();
    }

    ctx.say(response).await?;
    Ok(())
}
