mod address;
mod announce;
mod nudge;
mod recipient;
mod resend;
mod start;
mod status;

use address::address;
use announce::announce;
use nudge::nudge;
use poise::serenity_prelude::{Mention, UserId};
use recipient::recipient;
use resend::resend;
use start::start;
use status::status;
use tracing::error;

use crate::{
    santa::{InvitationReport, SantaError},
    structs::{Context, Error},
};

/// Secret santa gift exchange
#[poise::command(
    slash_command,
    guild_only,
    subcommands("announce", "start", "resend", "nudge", "status", "recipient", "address")
)]
pub async fn santa(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

fn mentions(users: &[UserId]) -> String {
    users
        .iter()
        .map(|user| Mention::User(*user).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Summary line of a batch of DMs, followed by whoever could not be reached.
fn describe_report(action: &str, report: &InvitationReport) -> String {
    let mut description = format!("{} {} message(s).", action, report.delivered);
    if !report.failed.is_empty() {
        description += format!(
            "\nCould not reach {} (DMs closed?)",
            mentions(&report.failed)
        )
        .as_str();
    }
    if !report.missing.is_empty() {
        description += format!(
            "\nNo invitation on record for {}, try `/santa resend` after they open their DMs",
            mentions(&report.missing)
        )
        .as_str();
    }
    if !report.unrecorded.is_empty() {
        description += format!(
            "\nDelivered but not saved for {}, their invitations won't update",
            mentions(&report.unrecorded)
        )
        .as_str();
    }
    description
}

/// Replies with what went wrong. Failures the user can't act on are logged
/// and answered with the generic message.
async fn report_failure(ctx: Context<'_>, err: SantaError) -> Result<(), Error> {
    let message = match &err {
        SantaError::InsufficientParticipants(found) => format!(
            "A secret santa needs at least 2 participants, only {found} signed up"
        ),
        SantaError::NotFound => "There is no secret santa round running here".to_owned(),
        SantaError::NotParticipant(_) => {
            "You are not part of the current secret santa round".to_owned()
        }
        SantaError::RoundConflict { .. } => {
            "Another round was started at the same time, check `/santa status` before trying again"
                .to_owned()
        }
        SantaError::MatchingFailed(_) | SantaError::Transport(_) | SantaError::Persistence(_) => {
            error!(
                guild_id = ctx.guild_id().map(|id| id.0),
                "Secret santa command failed: {err}"
            );
            ctx.data().translator.tr("error-generic").to_owned()
        }
    };

    ctx.say(message).await?;
    Ok(())
}
