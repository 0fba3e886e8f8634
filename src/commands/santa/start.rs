use super::{describe_report, report_failure};
use crate::{
    helpers::guild_id,
    santa::{resolve_participants, ENTRY_EMOJI},
    structs::{Context, Error},
};

/// Match everyone who signed up and send out the invitations
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn start(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let guild_id = guild_id(ctx)?;
    let data = ctx.data();

    let round = match data.query_handler.round(guild_id).await {
        Ok(round) => round,
        Err(err) => return report_failure(ctx, err.into()).await,
    };
    let Some((channel_id, message_id)) = round.as_ref().and_then(|round| round.announcement())
    else {
        ctx.say("Post a sign-up message with `/santa announce` first")
            .await?;
        return Ok(());
    };

    let participants =
        match resolve_participants(&data.discord, channel_id, message_id, ENTRY_EMOJI).await {
            Ok(participants) => participants,
            Err(err) => return report_failure(ctx, err).await,
        };

    match data.santa.start_round(guild_id, participants).await {
        Ok((pairing, report)) => {
            ctx.say(format!(
                "Secret santa started with {} participants!\n{}",
                pairing.len(),
                describe_report("Sent", &report)
            ))
            .await?;
        }
        Err(err) => report_failure(ctx, err).await?,
    }

    Ok(())
}
