//! Database access.
//!
//! A single task owns the SQLite pool and works through [`DbCommand`]s one at
//! a time, answering each on its oneshot callback. Every read-modify-write
//! therefore runs without interleaving, which the santa round and address
//! updates rely on.

mod birthdays;
mod guilds;
mod santa;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use poise::serenity_prelude::{ChannelId, GuildId, MessageId, UserId};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use thiserror::Error;
use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot,
};
use tracing::{debug, info, warn};

use crate::{
    models::{Birthday, Guild, NewGuild, SantaRound},
    santa::{store::AddressChange, InvitationRef, Pairing, PairingStore},
};

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("round changed, expected round {expected} but found {found}")]
    RoundConflict { expected: i64, found: i64 },
    #[error("stored pairing for guild {0} is inconsistent")]
    Corrupt(u64),
    #[error("data store is not running")]
    Disconnected,
}

pub struct CommandWithCallback<D, R> {
    pub data: D,
    pub callback: oneshot::Sender<Result<R, DbError>>,
}

pub enum DbCommand {
    AddGuild(CommandWithCallback<NewGuild, ()>),
    GetGuildData(CommandWithCallback<u64, Option<Guild>>),
    ListGuilds(CommandWithCallback<(), Vec<Guild>>),
    MarkAnnounced(CommandWithCallback<(u64, NaiveDate), ()>),
    SetBirthday(CommandWithCallback<Birthday, ()>),
    GetBirthday(CommandWithCallback<(u64, u64), Option<Birthday>>),
    RemoveBirthday(CommandWithCallback<(u64, u64), bool>),
    ListBirthdays(CommandWithCallback<u64, Vec<Birthday>>),
    SetAnnouncement(CommandWithCallback<(u64, u64, u64), ()>),
    GetRound(CommandWithCallback<u64, Option<SantaRound>>),
    SavePairing(CommandWithCallback<(u64, i64, Pairing), i64>),
    LoadPairing(CommandWithCallback<u64, Option<Pairing>>),
    RecordInvitation(CommandWithCallback<(u64, u64, InvitationRef), ()>),
    SetAddress(CommandWithCallback<(u64, u64, String), AddressChange>),
    MarkNudged(CommandWithCallback<(u64, Vec<u64>), ()>),
    Shutdown,
}

/// Opens (creating if needed) the database and brings its schema up to date.
pub async fn connect(database_url: &str) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // One connection: the query handler is the only user, and in-memory
    // databases only live as long as their connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Starts the task owning `pool` and returns a handle to talk to it.
pub fn spawn_query_handler(pool: SqlitePool) -> QueryHandler {
    let (sender, receiver) = mpsc::unbounded_channel();
    tokio::spawn(run_query_handler(pool, receiver));
    QueryHandler { sender }
}

fn respond<R>(callback: oneshot::Sender<Result<R, DbError>>, result: Result<R, DbError>) {
    if let Err(Err(err)) = callback.send(result) {
        warn!("Dropped data store error, nobody was waiting: {err}");
    }
}

async fn run_query_handler(pool: SqlitePool, mut receiver: UnboundedReceiver<DbCommand>) {
    info!("Data store ready");

    while let Some(command) = receiver.recv().await {
        match command {
            DbCommand::AddGuild(CommandWithCallback { data, callback }) => {
                respond(callback, guilds::upsert(&pool, &data).await)
            }
            DbCommand::GetGuildData(CommandWithCallback { data, callback }) => {
                respond(callback, guilds::get(&pool, data).await)
            }
            DbCommand::ListGuilds(CommandWithCallback { callback, .. }) => {
                respond(callback, guilds::list(&pool).await)
            }
            DbCommand::MarkAnnounced(CommandWithCallback { data, callback }) => {
                respond(callback, guilds::mark_announced(&pool, data.0, data.1).await)
            }
            DbCommand::SetBirthday(CommandWithCallback { data, callback }) => {
                respond(callback, birthdays::upsert(&pool, &data).await)
            }
            DbCommand::GetBirthday(CommandWithCallback { data, callback }) => {
                respond(callback, birthdays::get(&pool, data.0, data.1).await)
            }
            DbCommand::RemoveBirthday(CommandWithCallback { data, callback }) => {
                respond(callback, birthdays::remove(&pool, data.0, data.1).await)
            }
            DbCommand::ListBirthdays(CommandWithCallback { data, callback }) => {
                respond(callback, birthdays::list(&pool, data).await)
            }
            DbCommand::SetAnnouncement(CommandWithCallback { data, callback }) => {
                let (guild_id, channel_id, message_id) = data;
                let result = santa::set_announcement(&pool, guild_id, channel_id, message_id).await;
                respond(callback, result)
            }
            DbCommand::GetRound(CommandWithCallback { data, callback }) => {
                respond(callback, santa::get_round(&pool, data).await)
            }
            DbCommand::SavePairing(CommandWithCallback { data, callback }) => {
                let (guild_id, expected_round, pairing) = data;
                let result = santa::save_pairing(&pool, guild_id, expected_round, &pairing).await;
                respond(callback, result)
            }
            DbCommand::LoadPairing(CommandWithCallback { data, callback }) => {
                respond(callback, santa::load_pairing(&pool, data).await)
            }
            DbCommand::RecordInvitation(CommandWithCallback { data, callback }) => {
                let (guild_id, user_id, invitation) = data;
                let result = santa::record_invitation(&pool, guild_id, user_id, invitation).await;
                respond(callback, result)
            }
            DbCommand::SetAddress(CommandWithCallback { data, callback }) => {
                let (guild_id, user_id, address) = data;
                let result = santa::set_address(&pool, guild_id, user_id, &address).await;
                respond(callback, result)
            }
            DbCommand::MarkNudged(CommandWithCallback { data, callback }) => {
                respond(callback, santa::mark_nudged(&pool, data.0, &data.1).await)
            }
            DbCommand::Shutdown => {
                debug!("Data store received shutdown");
                break;
            }
        }
    }

    pool.close().await;
    info!("Data store closed");
}

/// Cloneable handle to the data store task.
#[derive(Clone)]
pub struct QueryHandler {
    sender: UnboundedSender<DbCommand>,
}

impl QueryHandler {
    async fn request<D, R>(
        &self,
        wrap: fn(CommandWithCallback<D, R>) -> DbCommand,
        data: D,
    ) -> Result<R, DbError> {
        let (callback, callback_recv) = oneshot::channel();

        self.sender
            .send(wrap(CommandWithCallback { data, callback }))
            .map_err(|_| DbError::Disconnected)?;

        callback_recv.await.map_err(|_| DbError::Disconnected)?
    }

    pub fn shutdown(&self) -> Result<(), DbError> {
        self.sender
            .send(DbCommand::Shutdown)
            .map_err(|_| DbError::Disconnected)
    }

    pub async fn add_guild(&self, guild: NewGuild) -> Result<(), DbError> {
        self.request(DbCommand::AddGuild, guild).await
    }

    pub async fn guild(&self, guild_id: GuildId) -> Result<Option<Guild>, DbError> {
        self.request(DbCommand::GetGuildData, guild_id.0).await
    }

    pub async fn is_guild_setup(&self, guild_id: GuildId) -> Result<bool, DbError> {
        Ok(self.guild(guild_id).await?.is_some())
    }

    pub async fn guilds(&self) -> Result<Vec<Guild>, DbError> {
        self.request(DbCommand::ListGuilds, ()).await
    }

    pub async fn mark_announced(&self, guild_id: GuildId, date: NaiveDate) -> Result<(), DbError> {
        self.request(DbCommand::MarkAnnounced, (guild_id.0, date)).await
    }

    pub async fn set_birthday(&self, birthday: Birthday) -> Result<(), DbError> {
        self.request(DbCommand::SetBirthday, birthday).await
    }

    pub async fn birthday(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<Birthday>, DbError> {
        self.request(DbCommand::GetBirthday, (guild_id.0, user_id.0))
            .await
    }

    /// Returns whether there was a birthday to remove.
    pub async fn remove_birthday(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<bool, DbError> {
        self.request(DbCommand::RemoveBirthday, (guild_id.0, user_id.0))
            .await
    }

    pub async fn birthdays(&self, guild_id: GuildId) -> Result<Vec<Birthday>, DbError> {
        self.request(DbCommand::ListBirthdays, guild_id.0).await
    }

    pub async fn set_announcement(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), DbError> {
        self.request(
            DbCommand::SetAnnouncement,
            (guild_id.0, channel_id.0, message_id.0),
        )
        .await
    }

    pub async fn round(&self, guild_id: GuildId) -> Result<Option<SantaRound>, DbError> {
        self.request(DbCommand::GetRound, guild_id.0).await
    }
}

#[async_trait]
impl PairingStore for QueryHandler {
    async fn current_round(&self, guild_id: GuildId) -> Result<i64, DbError> {
        Ok(self.round(guild_id).await?.map_or(0, |round| round.round))
    }

    async fn save(
        &self,
        guild_id: GuildId,
        expected_round: i64,
        pairing: &Pairing,
    ) -> Result<i64, DbError> {
        self.request(
            DbCommand::SavePairing,
            (guild_id.0, expected_round, pairing.clone()),
        )
        .await
    }

    async fn load(&self, guild_id: GuildId) -> Result<Option<Pairing>, DbError> {
        self.request(DbCommand::LoadPairing, guild_id.0).await
    }

    async fn record_invitation(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        invitation: InvitationRef,
    ) -> Result<(), DbError> {
        self.request(
            DbCommand::RecordInvitation,
            (guild_id.0, user_id.0, invitation),
        )
        .await
    }

    async fn set_address(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        address: &str,
    ) -> Result<AddressChange, DbError> {
        self.request(
            DbCommand::SetAddress,
            (guild_id.0, user_id.0, address.to_owned()),
        )
        .await
    }

    async fn mark_nudged(&self, guild_id: GuildId, user_ids: &[UserId]) -> Result<(), DbError> {
        let user_ids: Vec<u64> = user_ids.iter().map(|user_id| user_id.0).collect();
        self.request(DbCommand::MarkNudged, (guild_id.0, user_ids))
            .await
    }
}

#[cfg(test)]
mod tests;
