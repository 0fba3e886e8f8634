use crate::structs::{Context, Error};

/// Show what the bot is and how long it has been running
#[poise::command(slash_command)]
pub async fn info(ctx: Context<'_>) -> Result<(), Error> {
    let uptime = ctx.data().started.elapsed().as_secs();
    let (hours, minutes) = (uptime / 3600, uptime % 3600 / 60);

    ctx.say(format!(
        "**{}** v{}\n\
         Birthday announcements with `/birthday`, gift exchanges with `/santa`.\n\
         Up for {}h {}m",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        hours,
        minutes
    ))
    .await?;

    Ok(())
}
