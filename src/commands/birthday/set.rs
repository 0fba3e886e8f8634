use chrono::Datelike;
use tracing::{error, info};

use super::{weekday_name, Month};
use crate::{
    birthday::{BirthdayDate, BirthdayEntry},
    helpers::{guild_id, guild_today},
    models::Birthday,
    structs::{Context, Error},
};

/// Set your birthday
#[poise::command(slash_command, guild_only, ephemeral)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Day of the month"]
    #[min = 1]
    #[max = 31]
    day: u32,
    #[description = "Month"] month: Month,
    #[description = "Year you were born in (optional)"]
    #[min = 1900]
    #[max = 9999]
    year: Option<i32>,
    #[description = "Let others see your age (default: true)"] show_age: Option<bool>,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let today = guild_today(ctx, guild_id).await;

    if year.map_or(false, |year| year > today.year()) {
        ctx.say("You can't be born in the future").await?;
        return Ok(());
    }

    let date = match BirthdayDate::new(day, month.number(), year.unwrap_or(0)) {
        Ok(date) => date,
        Err(err) => {
            ctx.say(format!("That date doesn't work: {err}")).await?;
            return Ok(());
        }
    };

    let entry = BirthdayEntry {
        user_id: ctx.author().id,
        date,
        visible: show_age.unwrap_or(true),
    };

    if let Err(err) = ctx
        .data()
        .query_handler
        .set_birthday(Birthday::new(guild_id.0, &entry))
        .await
    {
        error!(guild_id = guild_id.0, user_id = entry.user_id.0, "Could not save birthday: {err}");
        ctx.say("Could not save your birthday: Data store returned error")
            .await?;
        return Ok(());
    }
    info!(guild_id = guild_id.0, user_id = entry.user_id.0, "Birthday set");

    let next = entry.next_occurrence(today);
    let mut response = format!(
        "Birthday saved! Your next one is on {}, {}",
        weekday_name(next.weekday().num_days_from_monday()),
        next.format("%B %-d, %Y")
    );
    if let Some(turning) = entry.date.turning(today) {
        response += format!(", when you turn {turning}").as_str();
    }
    if next == today {
        response += ". That's today, happy birthday!";
    }
    if let Ok(false) = ctx.data().query_handler.is_guild_setup(guild_id).await {
        response += "\nBirthdays aren't announced here until an admin runs `/setup`";
    }

    ctx.say(response).await?;
    Ok(())
}
