use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, MessageId, UserId};

use crate::{
    i18n::Translator,
    persistence::{self, QueryHandler},
    santa::{DeliveryError, Messenger, Participant, ReactionSource, Reactor},
};

/// Participants with ids `1..=n`, named `user{id}`.
pub fn participants(n: u64) -> Vec<Participant> {
    (1..=n)
        .map(|id| Participant::new(UserId(id), format!("user{id}")))
        .collect()
}

/// A data store over a fresh in-memory database.
pub async fn test_store() -> QueryHandler {
    let pool = persistence::connect("sqlite::memory:").await.unwrap();
    persistence::spawn_query_handler(pool)
}

pub fn translator() -> Arc<Translator> {
    Arc::new(Translator::load().unwrap())
}

type Message = (ChannelId, MessageId, String);

#[derive(Default)]
struct FakeState {
    next_message: u64,
    blocked: BTreeSet<UserId>,
    reactors: Vec<Reactor>,
    sent: Vec<Message>,
    edits: Vec<Message>,
}

/// Records everything sent instead of talking to Discord.
///
/// Every user's DM channel is `user id + 1000`; blocked users cannot be DMed.
#[derive(Default)]
pub struct FakeDiscord {
    state: Mutex<FakeState>,
}

impl FakeDiscord {
    pub fn dm_channel(user_id: UserId) -> ChannelId {
        ChannelId(user_id.0 + 1000)
    }

    pub fn block(&self, user_id: UserId) {
        self.state.lock().unwrap().blocked.insert(user_id);
    }

    pub fn set_reactors(&self, reactors: Vec<Reactor>) {
        self.state.lock().unwrap().reactors = reactors;
    }

    pub fn sent(&self) -> Vec<Message> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn edits(&self) -> Vec<Message> {
        self.state.lock().unwrap().edits.clone()
    }

    pub fn sent_to(&self, channel_id: ChannelId) -> Vec<String> {
        Self::contents(self.sent(), channel_id)
    }

    pub fn edits_to(&self, channel_id: ChannelId) -> Vec<String> {
        Self::contents(self.edits(), channel_id)
    }

    fn contents(messages: Vec<Message>, channel_id: ChannelId) -> Vec<String> {
        messages
            .into_iter()
            .filter(|(channel, _, _)| *channel == channel_id)
            .map(|(_, _, content)| content)
            .collect()
    }
}

#[async_trait]
impl Messenger for FakeDiscord {
    async fn create_direct_channel(&self, user_id: UserId) -> Result<ChannelId, DeliveryError> {
        if self.state.lock().unwrap().blocked.contains(&user_id) {
            return Err(DeliveryError::Rejected(format!("{} has DMs disabled", user_id.0)));
        }
        Ok(Self::dm_channel(user_id))
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, DeliveryError> {
        let mut state = self.state.lock().unwrap();
        state.next_message += 1;
        let message_id = MessageId(state.next_message);
        state.sent.push((channel_id, message_id, content.to_owned()));
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), DeliveryError> {
        let mut state = self.state.lock().unwrap();
        if !state
            .sent
            .iter()
            .any(|(channel, message, _)| *channel == channel_id && *message == message_id)
        {
            return Err(DeliveryError::Rejected("unknown message".to_owned()));
        }
        state.edits.push((channel_id, message_id, content.to_owned()));
        Ok(())
    }
}

#[async_trait]
impl ReactionSource for FakeDiscord {
    async fn list_reacting_users(
        &self,
        _channel_id: ChannelId,
        _message_id: MessageId,
        _emoji: char,
    ) -> Result<Vec<Reactor>, DeliveryError> {
        Ok(self.state.lock().unwrap().reactors.clone())
    }
}
