use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use poise::serenity_prelude::{self as serenity, ChannelId, GuildId, MessageId, UserId};
use thiserror::Error;
use tracing::{error, info, warn};

use super::{
    match_participants, store::AddressChange, InvitationRef, Pairing, PairingStore, Participant,
    SantaError,
};
use crate::i18n::Translator;

/// DMs in flight at once while fanning out to a round.
pub const MAX_CONCURRENT_DELIVERIES: usize = 4;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Discord(#[from] Box<serenity::Error>),
    #[error("message rejected: {0}")]
    Rejected(String),
}

impl From<serenity::Error> for DeliveryError {
    fn from(err: serenity::Error) -> Self {
        Self::Discord(Box::new(err))
    }
}

/// Outgoing Discord messages.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn create_direct_channel(&self, user_id: UserId) -> Result<ChannelId, DeliveryError>;

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, DeliveryError>;

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), DeliveryError>;

    async fn send_direct_message(
        &self,
        user_id: UserId,
        content: &str,
    ) -> Result<InvitationRef, DeliveryError> {
        let channel_id = self.create_direct_channel(user_id).await?;
        let message_id = self.send_message(channel_id, content).await?;
        Ok(InvitationRef {
            channel_id,
            message_id,
        })
    }
}

/// What happened to a batch of DMs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvitationReport {
    pub delivered: usize,
    /// Participants Discord refused to deliver to, sorted by id.
    pub failed: Vec<UserId>,
    /// Participants without a recorded invitation to edit, sorted by id.
    pub missing: Vec<UserId>,
    /// Delivered invitations whose message could not be recorded, sorted by id.
    /// They cannot be edited later until sent again.
    pub unrecorded: Vec<UserId>,
}

impl InvitationReport {
    fn finish(mut self) -> Self {
        self.failed.sort();
        self.missing.sort();
        self.unrecorded.sort();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressOutcome {
    /// Same address as stored, nothing was sent or edited.
    Unchanged,
    Updated(InvitationReport),
}

pub struct SecretSanta {
    store: Arc<dyn PairingStore>,
    messenger: Arc<dyn Messenger>,
    translator: Arc<Translator>,
}

impl SecretSanta {
    pub fn new(
        store: Arc<dyn PairingStore>,
        messenger: Arc<dyn Messenger>,
        translator: Arc<Translator>,
    ) -> Self {
        Self {
            store,
            messenger,
            translator,
        }
    }

    pub async fn pairing(&self, guild_id: GuildId) -> Result<Pairing, SantaError> {
        self.store.load(guild_id).await?.ok_or(SantaError::NotFound)
    }

    /// Draws a new pairing, replaces the guild's round with it and sends invitations.
    ///
    /// Fails with [`SantaError::RoundConflict`] when another round was started
    /// between reading the round number and saving. The returned pairing is the
    /// stored one, with the recorded invitations filled in.
    pub async fn start_round(
        &self,
        guild_id: GuildId,
        participants: Vec<Participant>,
    ) -> Result<(Pairing, InvitationReport), SantaError> {
        let expected_round = self.store.current_round(guild_id).await?;
        let pairing = match_participants(participants)?;
        let round = self.store.save(guild_id, expected_round, &pairing).await?;

        info!(
            guild_id = guild_id.0,
            round,
            participants = pairing.len(),
            "Started secret santa round"
        );

        let report = self.send_invitations(guild_id, &pairing).await;
        let pairing = match self.store.load(guild_id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => pairing,
            Err(err) => {
                warn!(guild_id = guild_id.0, "Could not reload pairing: {err}");
                pairing
            }
        };
        Ok((pairing, report))
    }

    /// DMs every giver their recipient and records where each message landed.
    ///
    /// Undeliverable participants are listed in the report, the rest of the
    /// batch still goes out. A failed write only affects its own participant.
    pub async fn send_invitations(&self, guild_id: GuildId, pairing: &Pairing) -> InvitationReport {
        let deliveries: Vec<_> = stream::iter(pairing.assignments())
            .map(|(giver, recipient)| async move {
                let content = self.render_invitation(giver, recipient);
                let result = self
                    .messenger
                    .send_direct_message(giver.user_id, &content)
                    .await;
                (giver.user_id, result)
            })
            .boxed()
            .buffer_unordered(MAX_CONCURRENT_DELIVERIES)
            .collect()
            .await;

        let mut report = InvitationReport::default();
        for (user_id, result) in deliveries {
            match result {
                Ok(invitation) => {
                    report.delivered += 1;
                    if let Err(err) = self
                        .store
                        .record_invitation(guild_id, user_id, invitation)
                        .await
                    {
                        error!(
                            guild_id = guild_id.0,
                            user_id = user_id.0,
                            "Could not record delivered invitation: {err}"
                        );
                        report.unrecorded.push(user_id);
                    }
                }
                Err(err) => {
                    warn!(
                        guild_id = guild_id.0,
                        user_id = user_id.0,
                        "Could not deliver invitation: {err}"
                    );
                    report.failed.push(user_id);
                }
            }
        }

        report.finish()
    }

    /// Re-renders every recorded invitation in place.
    pub async fn resend_invitations(
        &self,
        guild_id: GuildId,
    ) -> Result<InvitationReport, SantaError> {
        let pairing = self.pairing(guild_id).await?;
        let givers: Vec<_> = pairing.participants().map(|p| p.user_id).collect();
        Ok(self.refresh(&pairing, &givers).await)
    }

    /// Stores a participant's shipping address and shows it to everyone concerned.
    ///
    /// On change both the participant's own invitation and their santa's are
    /// edited, and the santa gets a fresh message pointing out the change.
    pub async fn set_address(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        address: &str,
    ) -> Result<AddressOutcome, SantaError> {
        let address = address.trim();

        match self.store.set_address(guild_id, user_id, address).await? {
            AddressChange::Updated => {}
            AddressChange::Unchanged => return Ok(AddressOutcome::Unchanged),
            AddressChange::NotParticipant => return Err(SantaError::NotParticipant(user_id)),
        }

        let pairing = self.pairing(guild_id).await?;
        let participant = pairing
            .participant(user_id)
            .ok_or(SantaError::NotParticipant(user_id))?;
        let santa = pairing.santa_of(user_id);

        let mut refresh_for = vec![user_id];
        refresh_for.extend(santa.map(|santa| santa.user_id));
        let mut report = self.refresh(&pairing, &refresh_for).await;

        if let Some(santa) = santa {
            let content = self.translator.format(
                "santa-address-changed",
                &[
                    ("recipient", participant.display_name.as_str()),
                    ("address", address),
                ],
            );
            match self.notify(santa, &content).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(
                        guild_id = guild_id.0,
                        user_id = santa.user_id.0,
                        "Could not notify santa of address change: {err}"
                    );
                    report.failed.push(santa.user_id);
                }
            }
        }

        Ok(AddressOutcome::Updated(report.finish()))
    }

    /// Reminds everyone without an address to share one.
    pub async fn nudge(&self, guild_id: GuildId) -> Result<InvitationReport, SantaError> {
        let pairing = self.pairing(guild_id).await?;
        let content = self.translator.tr("santa-nudge");

        let missing_address = pairing.participants().filter(|p| p.address.is_none());
        let results: Vec<_> = stream::iter(missing_address)
            .map(|participant| async move {
                (participant.user_id, self.notify(participant, content).await)
            })
            .boxed()
            .buffer_unordered(MAX_CONCURRENT_DELIVERIES)
            .collect()
            .await;

        let mut report = InvitationReport::default();
        let mut nudged = Vec::new();
        for (user_id, result) in results {
            match result {
                Ok(()) => nudged.push(user_id),
                Err(err) => {
                    warn!(
                        guild_id = guild_id.0,
                        user_id = user_id.0,
                        "Could not nudge participant: {err}"
                    );
                    report.failed.push(user_id);
                }
            }
        }

        self.store.mark_nudged(guild_id, &nudged).await?;
        report.delivered = nudged.len();
        Ok(report.finish())
    }

    /// The participant `giver` is gifting this round.
    pub async fn match_of(
        &self,
        guild_id: GuildId,
        giver: UserId,
    ) -> Result<Participant, SantaError> {
        self.pairing(guild_id)
            .await?
            .recipient_of(giver)
            .cloned()
            .ok_or(SantaError::NotParticipant(giver))
    }

    pub fn render_invitation(&self, giver: &Participant, recipient: &Participant) -> String {
        let recipient_address = match &recipient.address {
            Some(address) => self
                .translator
                .format("santa-recipient-address", &[("address", address.as_str())]),
            None => self.translator.tr("santa-recipient-address-missing").to_owned(),
        };
        let own_address = giver
            .address
            .as_deref()
            .unwrap_or_else(|| self.translator.tr("santa-own-address-missing"));

        self.translator.format(
            "santa-invitation",
            &[
                ("recipient", recipient.display_name.as_str()),
                ("recipient_address", recipient_address.as_str()),
                ("own_address", own_address),
            ],
        )
    }

    /// Sends a new DM, reusing the invitation's channel when there is one.
    async fn notify(&self, participant: &Participant, content: &str) -> Result<(), DeliveryError> {
        match participant.invitation {
            Some(invitation) => {
                self.messenger
                    .send_message(invitation.channel_id, content)
                    .await?;
            }
            None => {
                self.messenger
                    .send_direct_message(participant.user_id, content)
                    .await?;
            }
        }
        Ok(())
    }

    /// Edits the invitations held by `givers`.
    async fn refresh(&self, pairing: &Pairing, givers: &[UserId]) -> InvitationReport {
        let mut report = InvitationReport::default();
        let mut edits = Vec::new();

        for &giver_id in givers {
            let (Some(giver), Some(recipient)) =
                (pairing.participant(giver_id), pairing.recipient_of(giver_id))
            else {
                continue;
            };
            match giver.invitation {
                Some(invitation) => {
                    edits.push((giver_id, invitation, self.render_invitation(giver, recipient)))
                }
                None => report.missing.push(giver_id),
            }
        }

        let results: Vec<_> = stream::iter(edits)
            .map(|(giver_id, invitation, content)| async move {
                let result = self
                    .messenger
                    .edit_message(invitation.channel_id, invitation.message_id, &content)
                    .await;
                (giver_id, result)
            })
            .boxed()
            .buffer_unordered(MAX_CONCURRENT_DELIVERIES)
            .collect()
            .await;

        for (giver_id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(user_id = giver_id.0, "Could not update invitation: {err}");
                    report.failed.push(giver_id);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        persistence::{DbError, QueryHandler},
        test_utils::{participants, test_store, translator, FakeDiscord},
    };

    const GUILD: GuildId = GuildId(42);

    /// Real store that refuses to record invitations for `refused` users.
    struct RefusingStore {
        inner: QueryHandler,
        refused: Vec<UserId>,
    }

    #[async_trait]
    impl PairingStore for RefusingStore {
        async fn current_round(&self, guild_id: GuildId) -> Result<i64, DbError> {
            self.inner.current_round(guild_id).await
        }

        async fn save(
            &self,
            guild_id: GuildId,
            expected_round: i64,
            pairing: &Pairing,
        ) -> Result<i64, DbError> {
            self.inner.save(guild_id, expected_round, pairing).await
        }

        async fn load(&self, guild_id: GuildId) -> Result<Option<Pairing>, DbError> {
            self.inner.load(guild_id).await
        }

        async fn record_invitation(
            &self,
            guild_id: GuildId,
            user_id: UserId,
            invitation: InvitationRef,
        ) -> Result<(), DbError> {
            if self.refused.contains(&user_id) {
                return Err(DbError::Disconnected);
            }
            self.inner
                .record_invitation(guild_id, user_id, invitation)
                .await
        }

        async fn set_address(
            &self,
            guild_id: GuildId,
            user_id: UserId,
            address: &str,
        ) -> Result<AddressChange, DbError> {
            self.inner.set_address(guild_id, user_id, address).await
        }

        async fn mark_nudged(&self, guild_id: GuildId, user_ids: &[UserId]) -> Result<(), DbError> {
            self.inner.mark_nudged(guild_id, user_ids).await
        }
    }

    async fn setup() -> (SecretSanta, Arc<FakeDiscord>) {
        let discord = Arc::new(FakeDiscord::default());
        let santa = SecretSanta::new(Arc::new(test_store().await), discord.clone(), translator());
        (santa, discord)
    }

    #[tokio::test]
    async fn round_with_one_unreachable_participant() {
        let (santa, discord) = setup().await;
        discord.block(UserId(3));

        let (pairing, report) = santa.start_round(GUILD, participants(5)).await.unwrap();

        for (giver, recipient) in pairing.assignments() {
            assert_ne!(giver.user_id, recipient.user_id);
        }
        assert_eq!(report.delivered, 4);
        assert_eq!(report.failed, vec![UserId(3)]);
        assert_eq!(discord.sent().len(), 4);
        assert!(pairing.participant(UserId(3)).unwrap().invitation.is_none());
        assert!(pairing.participant(UserId(1)).unwrap().invitation.is_some());

        let stored = santa.pairing(GUILD).await.unwrap();
        assert_eq!(stored, pairing);
        assert!(stored.participant(UserId(3)).unwrap().invitation.is_none());
        assert_eq!(
            stored.participants().filter(|p| p.invitation.is_some()).count(),
            4
        );

        let resend = santa.resend_invitations(GUILD).await.unwrap();
        assert_eq!(resend.delivered, 4);
        assert!(resend.failed.is_empty());
        assert_eq!(resend.missing, vec![UserId(3)]);

        let edits = discord.edits();
        assert_eq!(edits.len(), 4);
        assert!(edits
            .iter()
            .all(|(channel, _, _)| *channel != FakeDiscord::dm_channel(UserId(3))));
    }

    #[tokio::test]
    async fn unrecorded_invitations_do_not_stop_the_batch() {
        let discord = Arc::new(FakeDiscord::default());
        discord.block(UserId(5));
        let store = RefusingStore {
            inner: test_store().await,
            refused: vec![UserId(1), UserId(2)],
        };
        let santa = SecretSanta::new(Arc::new(store), discord.clone(), translator());

        let (pairing, report) = santa.start_round(GUILD, participants(5)).await.unwrap();

        assert_eq!(discord.sent().len(), 4);
        assert_eq!(report.delivered, 4);
        assert_eq!(report.failed, vec![UserId(5)]);
        assert_eq!(report.unrecorded, vec![UserId(1), UserId(2)]);
        assert!(pairing.participant(UserId(3)).unwrap().invitation.is_some());
        assert!(pairing.participant(UserId(4)).unwrap().invitation.is_some());
        assert!(pairing.participant(UserId(1)).unwrap().invitation.is_none());

        let resend = santa.resend_invitations(GUILD).await.unwrap();
        assert_eq!(resend.delivered, 2);
        assert_eq!(resend.missing, vec![UserId(1), UserId(2), UserId(5)]);
    }

    #[tokio::test]
    async fn invitation_names_the_recipient() {
        let (santa, discord) = setup().await;
        let (pairing, _) = santa.start_round(GUILD, participants(3)).await.unwrap();

        for (giver, recipient) in pairing.assignments() {
            let content = discord
                .sent_to(FakeDiscord::dm_channel(giver.user_id))
                .pop()
                .unwrap();
            assert!(content.contains(&recipient.display_name));
        }
    }

    #[tokio::test]
    async fn too_few_participants_saves_nothing() {
        let (santa, discord) = setup().await;

        let err = santa.start_round(GUILD, participants(1)).await.unwrap_err();

        assert!(matches!(err, SantaError::InsufficientParticipants(1)));
        assert!(matches!(santa.pairing(GUILD).await, Err(SantaError::NotFound)));
        assert!(discord.sent().is_empty());
    }

    #[tokio::test]
    async fn new_round_replaces_the_old_one() {
        let (santa, _) = setup().await;
        santa.start_round(GUILD, participants(4)).await.unwrap();
        santa.set_address(GUILD, UserId(1), "1 Elm St").await.unwrap();

        santa.start_round(GUILD, participants(3)).await.unwrap();

        let pairing = santa.pairing(GUILD).await.unwrap();
        assert_eq!(pairing.len(), 3);
        assert!(pairing.participant(UserId(4)).is_none());
        assert_eq!(pairing.participant(UserId(1)).unwrap().address, None);
    }

    #[tokio::test]
    async fn address_refreshes_both_sides() {
        let (santa, discord) = setup().await;
        let (pairing, _) = santa.start_round(GUILD, participants(4)).await.unwrap();
        let santa_of_two = pairing.santa_of(UserId(2)).unwrap().user_id;
        let sent_before = discord.sent().len();

        let outcome = santa
            .set_address(GUILD, UserId(2), "  221B Baker Street  ")
            .await
            .unwrap();

        let AddressOutcome::Updated(report) = outcome else {
            panic!("expected an update, got {outcome:?}");
        };
        assert_eq!(report.delivered, 3);
        assert!(report.failed.is_empty());

        let edits = discord.edits();
        let edited: Vec<_> = edits.iter().map(|(channel, _, _)| *channel).collect();
        assert_eq!(edits.len(), 2);
        assert!(edited.contains(&FakeDiscord::dm_channel(UserId(2))));
        assert!(edited.contains(&FakeDiscord::dm_channel(santa_of_two)));

        let santa_view = discord
            .edits_to(FakeDiscord::dm_channel(santa_of_two))
            .pop()
            .unwrap();
        assert!(santa_view.contains("221B Baker Street"));

        let sent = discord.sent();
        assert_eq!(sent.len(), sent_before + 1);
        let (channel, _, notification) = sent.last().unwrap();
        assert_eq!(*channel, FakeDiscord::dm_channel(santa_of_two));
        assert!(notification.contains("221B Baker Street"));

        let stored = santa.pairing(GUILD).await.unwrap();
        let participant = stored.participant(UserId(2)).unwrap();
        assert_eq!(participant.address.as_deref(), Some("221B Baker Street"));
        assert!(!participant.pending_nudge);
    }

    #[tokio::test]
    async fn same_address_twice_is_a_no_op() {
        let (santa, discord) = setup().await;
        santa.start_round(GUILD, participants(3)).await.unwrap();

        let first = santa.set_address(GUILD, UserId(1), "North Pole").await.unwrap();
        assert!(matches!(first, AddressOutcome::Updated(_)));
        let edits = discord.edits().len();
        let sent = discord.sent().len();

        let second = santa.set_address(GUILD, UserId(1), "North Pole ").await.unwrap();

        assert_eq!(second, AddressOutcome::Unchanged);
        assert_eq!(discord.edits().len(), edits);
        assert_eq!(discord.sent().len(), sent);
    }

    #[tokio::test]
    async fn address_from_outsider_is_rejected() {
        let (santa, _) = setup().await;
        santa.start_round(GUILD, participants(3)).await.unwrap();

        let err = santa.set_address(GUILD, UserId(77), "Nowhere").await.unwrap_err();

        assert!(matches!(err, SantaError::NotParticipant(UserId(77))));
    }

    #[tokio::test]
    async fn nudge_only_reaches_missing_addresses() {
        let (santa, discord) = setup().await;
        santa.start_round(GUILD, participants(4)).await.unwrap();
        santa.set_address(GUILD, UserId(1), "Somewhere 1").await.unwrap();
        santa.set_address(GUILD, UserId(2), "Somewhere 2").await.unwrap();
        let sent_before = discord.sent().len();

        let report = santa.nudge(GUILD).await.unwrap();

        assert_eq!(report.delivered, 2);
        let nudged: Vec<_> = discord.sent()[sent_before..]
            .iter()
            .map(|(channel, _, _)| *channel)
            .collect();
        assert_eq!(nudged.len(), 2);
        assert!(nudged.contains(&FakeDiscord::dm_channel(UserId(3))));
        assert!(nudged.contains(&FakeDiscord::dm_channel(UserId(4))));

        let stored = santa.pairing(GUILD).await.unwrap();
        assert!(stored.participant(UserId(3)).unwrap().pending_nudge);
        assert!(!stored.participant(UserId(1)).unwrap().pending_nudge);
    }

    #[tokio::test]
    async fn match_of_returns_recipient() {
        let (santa, _) = setup().await;
        let (pairing, _) = santa.start_round(GUILD, participants(3)).await.unwrap();

        let recipient = santa.match_of(GUILD, UserId(1)).await.unwrap();

        assert_eq!(Some(&recipient), pairing.recipient_of(UserId(1)));
        assert!(matches!(
            santa.match_of(GUILD, UserId(9)).await,
            Err(SantaError::NotParticipant(_))
        ));
    }
}
