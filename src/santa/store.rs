use async_trait::async_trait;
use poise::serenity_prelude::{GuildId, UserId};

use super::{InvitationRef, Pairing};
use crate::persistence::DbError;

/// Result of writing a participant's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressChange {
    Updated,
    /// The stored address already matched.
    Unchanged,
    /// The user has no row in the guild's current round.
    NotParticipant,
}

/// Persistence for the active round of every guild.
///
/// Only one pairing is active per guild. Saving is a compare-and-swap on the
/// round number: `expected_round` must be what `current_round` returned
/// (0 when the guild never had a round), otherwise the save fails with
/// [`DbError::RoundConflict`] and nothing is written.
#[async_trait]
pub trait PairingStore: Send + Sync {
    async fn current_round(&self, guild_id: GuildId) -> Result<i64, DbError>;

    /// Replaces the guild's pairing and returns the new round number.
    async fn save(
        &self,
        guild_id: GuildId,
        expected_round: i64,
        pairing: &Pairing,
    ) -> Result<i64, DbError>;

    async fn load(&self, guild_id: GuildId) -> Result<Option<Pairing>, DbError>;

    async fn record_invitation(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        invitation: InvitationRef,
    ) -> Result<(), DbError>;

    /// Stores the address and clears the pending nudge, unless it is unchanged.
    async fn set_address(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        address: &str,
    ) -> Result<AddressChange, DbError>;

    async fn mark_nudged(&self, guild_id: GuildId, user_ids: &[UserId]) -> Result<(), DbError>;
}
