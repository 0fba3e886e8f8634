use tracing::{error, warn};

use crate::{
    birthday::upcoming,
    helpers::{get_display_name, guild_id, guild_today},
    structs::{Context, Error},
};

/// List the upcoming birthdays on this server
#[poise::command(slash_command, guild_only)]
pub async fn list(
    ctx: Context<'_>,
    #[description = "Maximum number of birthdays to list (default: 20)"]
    #[min = 1]
    #[max = 50]
    limit: Option<u32>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let guild_id = guild_id(ctx)?;
    let limit = limit.unwrap_or(20) as usize;

    let stored = match ctx.data().query_handler.birthdays(guild_id).await {
        Ok(stored) => stored,
        Err(err) => {
            error!(guild_id = guild_id.0, "Could not list birthdays: {err}");
            ctx.say("Listing failed: Could not retrieve birthdays from data store")
                .await?;
            return Ok(());
        }
    };

    let mut entries: Vec<_> = stored
        .iter()
        .filter_map(|birthday| match birthday.to_entry() {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(
                    guild_id = guild_id.0,
                    user_id = birthday.user_id,
                    "Skipping stored birthday: {err}"
                );
                None
            }
        })
        .collect();

    if entries.is_empty() {
        ctx.say("No birthdays set up in this server").await?;
        return Ok(());
    }

    let today = guild_today(ctx, guild_id).await;
    upcoming(&mut entries, today);

    let mut resp_string = "Upcoming birthdays:\n".to_owned();
    for entry in entries.iter().take(limit) {
        let name = get_display_name(ctx, guild_id, entry.user_id).await;
        let next = entry.next_occurrence(today);

        resp_string += format!("- {}: {}", name, next.format("%B %-d")).as_str();
        if let Some(age) = entry.upcoming_age(today) {
            resp_string += format!(" (turning {age})").as_str();
        }
        resp_string += "\n";
    }

    let remaining_entries = entries.len().saturating_sub(limit);
    if remaining_entries > 0 {
        resp_string += format!("... and {} more", remaining_entries).as_str();
    }

    ctx.say(resp_string).await?;
    Ok(())
}
