use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use sqlx::SqlitePool;

use super::DbError;
use crate::{
    models::{ParticipantRow, SantaRound},
    santa::{store::AddressChange, InvitationRef, Pairing},
};

pub async fn set_announcement(
    pool: &SqlitePool,
    guild_id: u64,
    channel_id: u64,
    message_id: u64,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO santa_rounds (guild_id, announce_channel, announce_message)
         VALUES (?, ?, ?)
         ON CONFLICT (guild_id) DO UPDATE SET
             announce_channel = excluded.announce_channel,
             announce_message = excluded.announce_message",
    )
    .bind(guild_id as i64)
    .bind(channel_id as i64)
    .bind(message_id as i64)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_round(pool: &SqlitePool, guild_id: u64) -> Result<Option<SantaRound>, DbError> {
    let round = sqlx::query_as::<_, SantaRound>("SELECT * FROM santa_rounds WHERE guild_id = ?")
        .bind(guild_id as i64)
        .fetch_optional(pool)
        .await?;

    Ok(round)
}

/// Replaces the guild's participants if the round is still `expected_round`.
pub async fn save_pairing(
    pool: &SqlitePool,
    guild_id: u64,
    expected_round: i64,
    pairing: &Pairing,
) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let found: i64 = sqlx::query_scalar("SELECT round FROM santa_rounds WHERE guild_id = ?")
        .bind(guild_id as i64)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(0);

    if found != expected_round {
        return Err(DbError::RoundConflict {
            expected: expected_round,
            found,
        });
    }
    let round = found + 1;

    sqlx::query(
        "INSERT INTO santa_rounds (guild_id, round, started_at)
         VALUES (?, ?, ?)
         ON CONFLICT (guild_id) DO UPDATE SET
             round = excluded.round,
             started_at = excluded.started_at",
    )
    .bind(guild_id as i64)
    .bind(round)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM santa_participants WHERE guild_id = ?")
        .bind(guild_id as i64)
        .execute(&mut *tx)
        .await?;

    for (giver, recipient) in pairing.assignments() {
        let row = ParticipantRow::new(guild_id, giver, recipient.user_id);
        sqlx::query(
            "INSERT INTO santa_participants
                 (guild_id, user_id, display_name, recipient_id, address,
                  pending_nudge, dm_channel, message_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.guild_id)
        .bind(row.user_id)
        .bind(&row.display_name)
        .bind(row.recipient_id)
        .bind(&row.address)
        .bind(row.pending_nudge)
        .bind(row.dm_channel)
        .bind(row.message_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(round)
}

pub async fn load_pairing(pool: &SqlitePool, guild_id: u64) -> Result<Option<Pairing>, DbError> {
    let rows = sqlx::query_as::<_, ParticipantRow>(
        "SELECT * FROM santa_participants WHERE guild_id = ? ORDER BY user_id",
    )
    .bind(guild_id as i64)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(None);
    }

    let mut participants = BTreeMap::new();
    let mut recipients = BTreeMap::new();
    for row in rows {
        let recipient = row.recipient();
        let participant = row.into_participant();
        recipients.insert(participant.user_id, recipient);
        participants.insert(participant.user_id, participant);
    }

    let distinct: BTreeSet<_> = recipients.values().collect();
    let consistent = distinct.len() == recipients.len()
        && recipients
            .iter()
            .all(|(giver, recipient)| giver != recipient && participants.contains_key(recipient));
    if !consistent {
        return Err(DbError::Corrupt(guild_id));
    }

    Ok(Some(Pairing::from_parts(participants, recipients)))
}

pub async fn record_invitation(
    pool: &SqlitePool,
    guild_id: u64,
    user_id: u64,
    invitation: InvitationRef,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE santa_participants SET dm_channel = ?, message_id = ?
         WHERE guild_id = ? AND user_id = ?",
    )
    .bind(invitation.channel_id.0 as i64)
    .bind(invitation.message_id.0 as i64)
    .bind(guild_id as i64)
    .bind(user_id as i64)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_address(
    pool: &SqlitePool,
    guild_id: u64,
    user_id: u64,
    address: &str,
) -> Result<AddressChange, DbError> {
    let updated = sqlx::query(
        "UPDATE santa_participants SET address = ?, pending_nudge = 0
         WHERE guild_id = ? AND user_id = ? AND (address IS NULL OR address <> ?)",
    )
    .bind(address)
    .bind(guild_id as i64)
    .bind(user_id as i64)
    .bind(address)
    .execute(pool)
    .await?;

    if updated.rows_affected() > 0 {
        return Ok(AddressChange::Updated);
    }

    let exists: Option<i64> = sqlx::query_scalar(
        "SELECT user_id FROM santa_participants WHERE guild_id = ? AND user_id = ?",
    )
    .bind(guild_id as i64)
    .bind(user_id as i64)
    .fetch_optional(pool)
    .await?;

    Ok(match exists {
        Some(_) => AddressChange::Unchanged,
        None => AddressChange::NotParticipant,
    })
}

pub async fn mark_nudged(
    pool: &SqlitePool,
    guild_id: u64,
    user_ids: &[u64],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    for user_id in user_ids {
        sqlx::query(
            "UPDATE santa_participants SET pending_nudge = 1 WHERE guild_id = ? AND user_id = ?",
        )
        .bind(guild_id as i64)
        .bind(*user_id as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
