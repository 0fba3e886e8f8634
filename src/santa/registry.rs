use std::collections::BTreeSet;

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, MessageId, UserId};

use super::{DeliveryError, Participant, SantaError};

/// A user who reacted to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reactor {
    pub user_id: UserId,
    pub name: String,
    pub bot: bool,
}

#[async_trait]
pub trait ReactionSource: Send + Sync {
    async fn list_reacting_users(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: char,
    ) -> Result<Vec<Reactor>, DeliveryError>;
}

/// Everyone eligible for a round: human reactors, each once, at least two.
pub async fn resolve_participants(
    source: &dyn ReactionSource,
    channel_id: ChannelId,
    message_id: MessageId,
    emoji: char,
) -> Result<Vec<Participant>, SantaError> {
    let reactors = source
        .list_reacting_users(channel_id, message_id, emoji)
        .await?;

    eligible(reactors)
}

fn eligible(reactors: Vec<Reactor>) -> Result<Vec<Participant>, SantaError> {
    let mut seen = BTreeSet::new();
    let participants: Vec<_> = reactors
        .into_iter()
        .filter(|reactor| !reactor.bot)
        .filter(|reactor| seen.insert(reactor.user_id))
        .map(|reactor| Participant::new(reactor.user_id, reactor.name))
        .collect();

    if participants.len() < 2 {
        return Err(SantaError::InsufficientParticipants(participants.len()));
    }
    Ok(participants)
}
