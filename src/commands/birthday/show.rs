use chrono::Datelike;
use poise::serenity_prelude::User;
use tracing::error;

use super::weekday_name;
use crate::{
    helpers::{get_display_name, guild_id, guild_today},
    structs::{Context, Error},
};

/// Show when someone's birthday is
#[poise::command(slash_command, guild_only)]
pub async fn show(
    ctx: Context<'_>,
    #[description = "Whose birthday to show (default: yours)"] user: Option<User>,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let user_id = user.as_ref().map_or(ctx.author().id, |user| user.id);
    let own = user_id == ctx.author().id;

    let stored = match ctx.data().query_handler.birthday(guild_id, user_id).await {
        Ok(stored) => stored,
        Err(err) => {
            error!(guild_id = guild_id.0, user_id = user_id.0, "Could not fetch birthday: {err}");
            ctx.say("Lookup failed: Data store returned error").await?;
            return Ok(());
        }
    };
    let name = get_display_name(ctx, guild_id, user_id).await;

    let entry = match stored.map(|birthday| birthday.to_entry()) {
        Some(Ok(entry)) => entry,
        Some(Err(err)) => {
            error!(guild_id = guild_id.0, user_id = user_id.0, "Stored birthday is invalid: {err}");
            ctx.say("Lookup failed: The stored birthday is invalid").await?;
            return Ok(());
        }
        None => {
            ctx.say(format!("{name} has not set a birthday")).await?;
            return Ok(());
        }
    };

    let today = guild_today(ctx, guild_id).await;
    let next = entry.next_occurrence(today);
    let days_left = (next - today).num_days();
    let show_year = own || entry.visible;

    let mut response = match entry.date.year() {
        Some(year) if show_year => format!(
            "{name} was born on a {}, {} {}",
            weekday_name(entry.date.day_of_week(today.year())?),
            entry.date.label(),
            year
        ),
        _ => format!("{name}'s birthday is on {}", entry.date.label()),
    };

    response += match days_left {
        0 => ". That's today!".to_owned(),
        1 => ". That's tomorrow!".to_owned(),
        _ => format!(". Next one in {days_left} days"),
    }
    .as_str();

    let turning = if show_year { entry.date.turning(today) } else { None };
    if let Some(turning) = turning {
        response += format!(" (turning {turning})").as_str();
    }

    ctx.say(response).await?;
    Ok(())
}
