use chrono_tz::Tz;
use poise::serenity_prelude::Channel;
use tracing::{error, info};

use crate::{
    helpers::{autocomplete_tz, guild_id},
    models::NewGuild,
    structs::{Context, Error},
};

/// Set up (or reconfigure) birthday announcements for this server
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR | MANAGE_GUILD"
)]
pub async fn setup(
    ctx: Context<'_>,
    #[description = "The channel birthday announcements are posted in"] channel: Channel,
    #[description = "The timezone birthdays are counted in (default: UTC)"]
    #[autocomplete = "autocomplete_tz"]
    timezone: Option<String>,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;

    let timezone = match timezone {
        Some(name) => match Tz::from_str_insensitive(&name) {
            Ok(tz) => Some(tz.name().to_owned()),
            Err(_) => {
                ctx.say("Setup failed: Invalid timezone provided").await?;
                return Ok(());
            }
        },
        None => None,
    };

    let new_guild = NewGuild {
        guild_id: guild_id.0 as i64,
        announcement_channel: channel.id().0 as i64,
        timezone_name: timezone.clone(),
    };

    match ctx.data().query_handler.add_guild(new_guild).await {
        Ok(()) => {
            info!(guild_id = guild_id.0, channel_id = channel.id().0, "Guild set up");
            ctx.say(format!(
                "Setup successful! Birthdays will be announced in {} ({})",
                channel,
                timezone.as_deref().unwrap_or("UTC")
            ))
            .await?
        }
        Err(err) => {
            error!(guild_id = guild_id.0, "Setup failed: {err}");
            ctx.say("Setup may have failed: Data store returned error")
                .await?
        }
    };

    Ok(())
}
