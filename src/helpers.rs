use chrono::{NaiveDate, Utc};
use chrono_tz::TZ_VARIANTS;
use poise::{
    serenity_prelude::{GuildId, UserId},
    AutocompleteChoice,
};
use tracing::warn;

use crate::structs::{Context, Error};

/// Guild of the invocation; commands using this are registered `guild_only`.
pub fn guild_id(ctx: Context<'_>) -> Result<GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| "Only works inside servers".into())
}

pub async fn autocomplete_tz<'a>(
    _ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = AutocompleteChoice<String>> + 'a {
    let partial = partial.to_lowercase();
    TZ_VARIANTS
        .iter()
        .map(|tz| tz.name())
        .filter(move |name| name.to_lowercase().starts_with(&partial))
        .take(25)
        .map(String::from)
        .map(AutocompleteChoice::from)
}

/// Nickname in the guild, falling back to the account name.
pub async fn get_display_name(ctx: Context<'_>, guild_id: GuildId, user_id: UserId) -> String {
    match user_id.to_user(ctx).await {
        Ok(user) => match user.nick_in(ctx, guild_id).await {
            Some(nick) => nick,
            None => user.name,
        },
        Err(err) => {
            warn!(user_id = user_id.0, "Could not fetch user: {err}");
            "Unknown User".to_owned()
        }
    }
}

/// The current date where the guild lives, UTC until the guild is set up.
pub async fn guild_today(ctx: Context<'_>, guild_id: GuildId) -> NaiveDate {
    let timezone = match ctx.data().query_handler.guild(guild_id).await {
        Ok(Some(guild)) => guild.timezone(),
        Ok(None) => chrono_tz::UTC,
        Err(err) => {
            warn!(guild_id = guild_id.0, "Could not fetch guild timezone: {err}");
            chrono_tz::UTC
        }
    };
    Utc::now().with_timezone(&timezone).date_naive()
}
