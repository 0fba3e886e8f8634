use sqlx::SqlitePool;

use super::DbError;
use crate::models::Birthday;

/// Inserts or fully replaces the user's birthday in the guild.
pub async fn upsert(pool: &SqlitePool, birthday: &Birthday) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO birthdays (guild_id, user_id, day, month, year, visible)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (guild_id, user_id) DO UPDATE SET
             day = excluded.day,
             month = excluded.month,
             year = excluded.year,
             visible = excluded.visible",
    )
    .bind(birthday.guild_id)
    .bind(birthday.user_id)
    .bind(birthday.day)
    .bind(birthday.month)
    .bind(birthday.year)
    .bind(birthday.visible)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(
    pool: &SqlitePool,
    guild_id: u64,
    user_id: u64,
) -> Result<Option<Birthday>, DbError> {
    let birthday = sqlx::query_as::<_, Birthday>(
        "SELECT * FROM birthdays WHERE guild_id = ? AND user_id = ?",
    )
    .bind(guild_id as i64)
    .bind(user_id as i64)
    .fetch_optional(pool)
    .await?;

    Ok(birthday)
}

pub async fn remove(pool: &SqlitePool, guild_id: u64, user_id: u64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM birthdays WHERE guild_id = ? AND user_id = ?")
        .bind(guild_id as i64)
        .bind(user_id as i64)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list(pool: &SqlitePool, guild_id: u64) -> Result<Vec<Birthday>, DbError> {
    let birthdays = sqlx::query_as::<_, Birthday>(
        "SELECT * FROM birthdays WHERE guild_id = ? ORDER BY month, day, user_id",
    )
    .bind(guild_id as i64)
    .fetch_all(pool)
    .await?;

    Ok(birthdays)
}
