use chrono::NaiveDate;
use poise::serenity_prelude::{ChannelId, GuildId, MessageId, UserId};

use super::*;
use crate::{
    birthday::{BirthdayDate, BirthdayEntry},
    santa::match_participants,
    test_utils::{participants, test_store},
};

const GUILD: GuildId = GuildId(7);

fn birthday(user: u64, day: u32, month: u32, year: i32) -> Birthday {
    Birthday::new(
        GUILD.0,
        &BirthdayEntry {
            user_id: UserId(user),
            date: BirthdayDate::new(day, month, year).unwrap(),
            visible: true,
        },
    )
}

#[tokio::test]
async fn guild_setup_round_trip() {
    let store = test_store().await;
    assert!(!store.is_guild_setup(GUILD).await.unwrap());

    store
        .add_guild(NewGuild {
            guild_id: GUILD.0 as i64,
            announcement_channel: 11,
            timezone_name: Some("Europe/Berlin".to_owned()),
        })
        .await
        .unwrap();
    store
        .add_guild(NewGuild {
            guild_id: GUILD.0 as i64,
            announcement_channel: 12,
            timezone_name: None,
        })
        .await
        .unwrap();

    let guild = store.guild(GUILD).await.unwrap().unwrap();
    assert_eq!(guild.announcement_channel, 12);
    assert_eq!(guild.timezone(), chrono_tz::Tz::UTC);
    assert_eq!(guild.last_announced(), None);

    let today = NaiveDate::from_ymd_opt(2024, 12, 24).unwrap();
    store.mark_announced(GUILD, today).await.unwrap();
    assert_eq!(store.guilds().await.unwrap()[0].last_announced(), Some(today));
}

#[tokio::test]
async fn birthdays_are_replaced_and_removed() {
    let store = test_store().await;

    store.set_birthday(birthday(1, 3, 4, 1990)).await.unwrap();
    store.set_birthday(birthday(2, 29, 2, 0)).await.unwrap();
    store.set_birthday(birthday(1, 5, 1, 0)).await.unwrap();

    let stored = store.birthday(GUILD, UserId(1)).await.unwrap().unwrap();
    assert_eq!(stored, birthday(1, 5, 1, 0));
    assert_eq!(stored.to_entry().unwrap().date.year(), None);

    let all = store.birthdays(GUILD).await.unwrap();
    let users: Vec<_> = all.iter().map(|b| b.user_id).collect();
    assert_eq!(users, vec![1, 2]);

    assert!(store.remove_birthday(GUILD, UserId(1)).await.unwrap());
    assert!(!store.remove_birthday(GUILD, UserId(1)).await.unwrap());
    assert_eq!(store.birthday(GUILD, UserId(1)).await.unwrap(), None);
    assert!(store.birthdays(GuildId(8)).await.unwrap().is_empty());
}

#[tokio::test]
async fn saved_pairing_loads_back_equal() {
    let store = test_store().await;
    let pairing = match_participants(participants(6)).unwrap();

    assert_eq!(store.current_round(GUILD).await.unwrap(), 0);
    assert_eq!(store.save(GUILD, 0, &pairing).await.unwrap(), 1);

    assert_eq!(store.load(GUILD).await.unwrap(), Some(pairing.clone()));
    assert_eq!(store.load(GUILD).await.unwrap(), Some(pairing));
    assert_eq!(store.current_round(GUILD).await.unwrap(), 1);
    assert_eq!(store.load(GuildId(8)).await.unwrap(), None);
}

#[tokio::test]
async fn stale_round_is_rejected() {
    let store = test_store().await;
    let first = match_participants(participants(3)).unwrap();
    let second = match_participants(participants(4)).unwrap();

    store.save(GUILD, 0, &first).await.unwrap();
    let err = store.save(GUILD, 0, &second).await.unwrap_err();

    assert!(matches!(
        err,
        DbError::RoundConflict {
            expected: 0,
            found: 1
        }
    ));
    assert_eq!(store.load(GUILD).await.unwrap(), Some(first));
    assert_eq!(store.save(GUILD, 1, &second).await.unwrap(), 2);
}

#[tokio::test]
async fn announcement_keeps_round_number() {
    let store = test_store().await;
    store
        .set_announcement(GUILD, ChannelId(1), MessageId(2))
        .await
        .unwrap();
    assert_eq!(store.current_round(GUILD).await.unwrap(), 0);

    let pairing = match_participants(participants(2)).unwrap();
    store.save(GUILD, 0, &pairing).await.unwrap();
    store
        .set_announcement(GUILD, ChannelId(3), MessageId(4))
        .await
        .unwrap();

    let round = store.round(GUILD).await.unwrap().unwrap();
    assert_eq!(round.round, 1);
    assert_eq!(round.announcement(), Some((ChannelId(3), MessageId(4))));
}

#[tokio::test]
async fn address_changes_once() {
    let store = test_store().await;
    let pairing = match_participants(participants(3)).unwrap();
    store.save(GUILD, 0, &pairing).await.unwrap();

    assert_eq!(
        store.set_address(GUILD, UserId(2), "Home").await.unwrap(),
        AddressChange::Updated
    );
    assert_eq!(
        store.set_address(GUILD, UserId(2), "Home").await.unwrap(),
        AddressChange::Unchanged
    );
    assert_eq!(
        store.set_address(GUILD, UserId(2), "Away").await.unwrap(),
        AddressChange::Updated
    );
    assert_eq!(
        store.set_address(GUILD, UserId(9), "Home").await.unwrap(),
        AddressChange::NotParticipant
    );

    let participant = store
        .load(GUILD)
        .await
        .unwrap()
        .unwrap()
        .participant(UserId(2))
        .cloned()
        .unwrap();
    assert_eq!(participant.address.as_deref(), Some("Away"));
    assert!(!participant.pending_nudge);

    store.mark_nudged(GUILD, &[UserId(2)]).await.unwrap();
    let reloaded = store.load(GUILD).await.unwrap().unwrap();
    assert!(reloaded.participant(UserId(2)).unwrap().pending_nudge);
}

#[tokio::test]
async fn invitation_reference_is_recorded() {
    let store = test_store().await;
    let pairing = match_participants(participants(2)).unwrap();
    store.save(GUILD, 0, &pairing).await.unwrap();

    let invitation = InvitationRef {
        channel_id: ChannelId(100),
        message_id: MessageId(200),
    };
    store
        .record_invitation(GUILD, UserId(1), invitation)
        .await
        .unwrap();

    let loaded = store.load(GUILD).await.unwrap().unwrap();
    assert_eq!(loaded.participant(UserId(1)).unwrap().invitation, Some(invitation));
    assert_eq!(loaded.participant(UserId(2)).unwrap().invitation, None);
}

#[tokio::test]
async fn shut_down_store_reports_disconnected() {
    let store = test_store().await;
    store.shutdown().unwrap();

    assert!(matches!(
        store.guild(GUILD).await,
        Err(DbError::Disconnected)
    ));
}
