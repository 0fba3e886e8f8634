//! Secret santa gift exchange.
//!
//! A round enrols everyone who reacted to the round's announcement message,
//! draws a derangement over them and DMs every giver who they are gifting.
//! Participants then fill in their shipping address, which is pushed into
//! both their own invitation and the one held by their santa.

pub mod invite;
pub mod matcher;
pub mod registry;
pub mod store;

use std::collections::BTreeMap;

use poise::serenity_prelude::{ChannelId, MessageId, UserId};
use thiserror::Error;

use crate::persistence::DbError;

pub use invite::{AddressOutcome, DeliveryError, InvitationReport, Messenger, SecretSanta};
pub use matcher::match_participants;
pub use registry::{resolve_participants, Reactor, ReactionSource};
pub use store::{AddressChange, PairingStore};

/// Emoji participants react with to join a round.
pub const ENTRY_EMOJI: char = '🎁';

#[derive(Debug, Error)]
pub enum SantaError {
    #[error("at least 2 participants are needed, found {0}")]
    InsufficientParticipants(usize),
    #[error("no valid pairing found after {0} attempts")]
    MatchingFailed(usize),
    #[error("no active secret santa round")]
    NotFound,
    #[error("{0} is not part of the current round")]
    NotParticipant(UserId),
    #[error("round changed while starting, expected round {expected} but found {found}")]
    RoundConflict { expected: i64, found: i64 },
    #[error("Discord request failed: {0}")]
    Transport(#[from] DeliveryError),
    #[error("storage failure: {0}")]
    Persistence(#[source] DbError),
}

impl From<DbError> for SantaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::RoundConflict { expected, found } => Self::RoundConflict { expected, found },
            other => Self::Persistence(other),
        }
    }
}

/// Where a participant's invitation DM lives, so it can be edited later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvitationRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: UserId,
    pub display_name: String,
    pub address: Option<String>,
    pub pending_nudge: bool,
    pub invitation: Option<InvitationRef>,
}

impl Participant {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            address: None,
            pending_nudge: true,
            invitation: None,
        }
    }
}

/// Giver to recipient assignment for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    participants: BTreeMap<UserId, Participant>,
    recipients: BTreeMap<UserId, UserId>,
}

impl Pairing {
    /// Builds a pairing from already-checked parts.
    ///
    /// Every participant must be a giver exactly once and a recipient exactly
    /// once, and nobody may receive from themselves.
    pub(crate) fn from_parts(
        participants: BTreeMap<UserId, Participant>,
        recipients: BTreeMap<UserId, UserId>,
    ) -> Self {
        debug_assert_eq!(participants.len(), recipients.len());
        debug_assert!(recipients.iter().all(|(giver, recipient)| giver != recipient));
        Self {
            participants,
            recipients,
        }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participant(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.get(&user_id)
    }

    pub(crate) fn participant_mut(&mut self, user_id: UserId) -> Option<&mut Participant> {
        self.participants.get_mut(&user_id)
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Who `giver` is gifting.
    pub fn recipient_of(&self, giver: UserId) -> Option<&Participant> {
        self.recipients
            .get(&giver)
            .and_then(|recipient| self.participants.get(recipient))
    }

    /// Who is gifting `recipient`.
    pub fn santa_of(&self, recipient: UserId) -> Option<&Participant> {
        self.recipients
            .iter()
            .find(|(_, r)| **r == recipient)
            .and_then(|(giver, _)| self.participants.get(giver))
    }

    /// `(giver, recipient)` for every participant, ordered by giver id.
    pub fn assignments(&self) -> impl Iterator<Item = (&Participant, &Participant)> {
        self.recipients.iter().filter_map(|(giver, recipient)| {
            Some((self.participants.get(giver)?, self.participants.get(recipient)?))
        })
    }
}
