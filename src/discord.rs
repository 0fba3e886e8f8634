use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, Http, MessageId, ReactionType, UserId};

use crate::santa::{DeliveryError, Messenger, ReactionSource, Reactor};

/// Discord's cap on users returned per reaction page.
const REACTION_PAGE: u8 = 100;

/// [`Messenger`] and [`ReactionSource`] over serenity's HTTP client.
#[derive(Clone)]
pub struct DiscordHttp {
    http: Arc<Http>,
}

impl DiscordHttp {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Messenger for DiscordHttp {
    async fn create_direct_channel(&self, user_id: UserId) -> Result<ChannelId, DeliveryError> {
        let channel = user_id.create_dm_channel(&*self.http).await?;
        Ok(channel.id)
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, DeliveryError> {
        let message = channel_id
            .send_message(&self.http, |m| m.content(content))
            .await?;
        Ok(message.id)
    }

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), DeliveryError> {
        channel_id
            .edit_message(&self.http, message_id, |m| m.content(content))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReactionSource for DiscordHttp {
    async fn list_reacting_users(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: char,
    ) -> Result<Vec<Reactor>, DeliveryError> {
        let mut reactors = Vec::new();
        let mut after = None;

        loop {
            let page = channel_id
                .reaction_users(
                    &self.http,
                    message_id,
                    ReactionType::from(emoji),
                    Some(REACTION_PAGE),
                    after,
                )
                .await?;

            let full_page = page.len() == REACTION_PAGE as usize;
            after = page.last().map(|user| user.id);
            reactors.extend(page.into_iter().map(|user| Reactor {
                user_id: user.id,
                name: user.name,
                bot: user.bot,
            }));

            if !full_page {
                return Ok(reactors);
            }
        }
    }
}
