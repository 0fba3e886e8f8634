use chrono::NaiveDate;
use sqlx::SqlitePool;

use super::DbError;
use crate::models::{Guild, NewGuild, DATE_FORMAT};

pub async fn upsert(pool: &SqlitePool, guild: &NewGuild) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO guilds (guild_id, announcement_channel, timezone_name)
         VALUES (?, ?, ?)
         ON CONFLICT (guild_id) DO UPDATE SET
             announcement_channel = excluded.announcement_channel,
             timezone_name = excluded.timezone_name",
    )
    .bind(guild.guild_id)
    .bind(guild.announcement_channel)
    .bind(&guild.timezone_name)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &SqlitePool, guild_id: u64) -> Result<Option<Guild>, DbError> {
    let guild = sqlx::query_as::<_, Guild>("SELECT * FROM guilds WHERE guild_id = ?")
        .bind(guild_id as i64)
        .fetch_optional(pool)
        .await?;

    Ok(guild)
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Guild>, DbError> {
    let guilds = sqlx::query_as::<_, Guild>("SELECT * FROM guilds ORDER BY guild_id")
        .fetch_all(pool)
        .await?;

    Ok(guilds)
}

pub async fn mark_announced(
    pool: &SqlitePool,
    guild_id: u64,
    date: NaiveDate,
) -> Result<(), DbError> {
    sqlx::query("UPDATE guilds SET last_announced = ? WHERE guild_id = ?")
        .bind(date.format(DATE_FORMAT).to_string())
        .bind(guild_id as i64)
        .execute(pool)
        .await?;

    Ok(())
}
