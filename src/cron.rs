use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use poise::serenity_prelude::{GuildId, Http, Mention};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    birthday::{celebrating_on, BirthdayEntry},
    i18n::Translator,
    models::Guild,
    persistence::{DbError, QueryHandler},
};

const CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Announces birthdays once per local day in every configured guild until
/// `shutdown` flips to true.
pub async fn bday_crunching(
    http: Arc<Http>,
    query_handler: QueryHandler,
    translator: Arc<Translator>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval_timer = tokio::time::interval(CHECK_INTERVAL);
    info!("Birthday announcements running");

    loop {
        tokio::select! {
            _ = interval_timer.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let guilds = match query_handler.guilds().await {
            Ok(guilds) => guilds,
            Err(err) => {
                error!("Could not fetch guilds for birthday announcements: {err}");
                continue;
            }
        };

        for guild in guilds {
            if let Err(err) = announce_guild(&http, &query_handler, &translator, &guild).await {
                error!(guild_id = guild.guild_id, "Birthday announcement failed: {err}");
            }
        }
    }

    info!("Birthday announcements stopped");
}

/// The guild's current date if it has not been announced yet.
fn due_date(guild: &Guild, now: DateTime<Utc>) -> Option<NaiveDate> {
    let today = now.with_timezone(&guild.timezone()).date_naive();
    match guild.last_announced() {
        Some(last) if last >= today => None,
        _ => Some(today),
    }
}

/// One line per birthday celebrated on `date`.
pub fn announcements(
    translator: &Translator,
    entries: &[BirthdayEntry],
    date: NaiveDate,
) -> Vec<String> {
    celebrating_on(entries, date)
        .into_iter()
        .map(|entry| {
            let user = Mention::User(entry.user_id).to_string();
            match entry.upcoming_age(date) {
                Some(age) => translator.format(
                    "birthday-announcement-age",
                    &[("user", user.as_str()), ("age", age.to_string().as_str())],
                ),
                None => translator.format("birthday-announcement", &[("user", user.as_str())]),
            }
        })
        .collect()
}

/// Claims today's announcement for `guild` and returns the lines to post.
///
/// The day is marked as announced before anything is posted. If that write
/// fails nothing is posted, so a broken data store can't repeat the same
/// announcements every tick.
async fn claim_announcements(
    query_handler: &QueryHandler,
    translator: &Translator,
    guild: &Guild,
    now: DateTime<Utc>,
) -> Result<Vec<String>, DbError> {
    let Some(today) = due_date(guild, now) else {
        return Ok(Vec::new());
    };
    let guild_id = GuildId(guild.guild_id as u64);

    let entries: Vec<_> = query_handler
        .birthdays(guild_id)
        .await?
        .iter()
        .filter_map(|birthday| match birthday.to_entry() {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(
                    guild_id = guild.guild_id,
                    user_id = birthday.user_id,
                    "Skipping stored birthday: {err}"
                );
                None
            }
        })
        .collect();

    query_handler.mark_announced(guild_id, today).await?;
    debug!(guild_id = guild.guild_id, %today, "Birthday announcements claimed");

    Ok(announcements(translator, &entries, today))
}

async fn announce_guild(
    http: &Arc<Http>,
    query_handler: &QueryHandler,
    translator: &Translator,
    guild: &Guild,
) -> Result<(), DbError> {
    let channel = guild.announcement_channel();
    for message in claim_announcements(query_handler, translator, guild, Utc::now()).await? {
        if let Err(err) = channel.say(http, message).await {
            warn!(guild_id = guild.guild_id, "Could not post birthday announcement: {err}");
        }
    }
    Ok(())
}
