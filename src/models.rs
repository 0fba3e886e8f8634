use chrono::NaiveDate;
use chrono_tz::Tz;
use poise::serenity_prelude::{ChannelId, MessageId, UserId};

use crate::{
    birthday::{BirthdayDate, BirthdayEntry, DateError},
    santa::{InvitationRef, Participant},
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub guild_id: i64,
    pub announcement_channel: i64,
    pub timezone_name: Option<String>,
    pub last_announced: Option<String>,
}

impl Guild {
    /// Falls back to UTC when unset or no longer a known zone.
    pub fn timezone(&self) -> Tz {
        self.timezone_name
            .as_deref()
            .and_then(|name| Tz::from_str_insensitive(name).ok())
            .unwrap_or(Tz::UTC)
    }

    pub fn announcement_channel(&self) -> ChannelId {
        ChannelId(self.announcement_channel as u64)
    }

    pub fn last_announced(&self) -> Option<NaiveDate> {
        self.last_announced
            .as_deref()
            .and_then(|date| NaiveDate::parse_from_str(date, DATE_FORMAT).ok())
    }
}

#[derive(PartialEq, Debug)]
pub struct NewGuild {
    pub guild_id: i64,
    pub announcement_channel: i64,
    pub timezone_name: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Birthday {
    pub guild_id: i64,
    pub user_id: i64,
    pub day: i64,
    pub month: i64,
    pub year: i64,
    pub visible: bool,
}

impl Birthday {
    pub fn new(guild_id: u64, entry: &BirthdayEntry) -> Self {
        Self {
            guild_id: guild_id as i64,
            user_id: entry.user_id.0 as i64,
            day: entry.date.day() as i64,
            month: entry.date.month() as i64,
            year: entry.date.year().unwrap_or(0) as i64,
            visible: entry.visible,
        }
    }

    pub fn to_entry(&self) -> Result<BirthdayEntry, DateError> {
        Ok(BirthdayEntry {
            user_id: UserId(self.user_id as u64),
            date: BirthdayDate::new(self.day as u32, self.month as u32, self.year as i32)?,
            visible: self.visible,
        })
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct SantaRound {
    pub guild_id: i64,
    pub round: i64,
    pub announce_channel: Option<i64>,
    pub announce_message: Option<i64>,
    pub started_at: Option<String>,
}

impl SantaRound {
    pub fn announcement(&self) -> Option<(ChannelId, MessageId)> {
        Some((
            ChannelId(self.announce_channel? as u64),
            MessageId(self.announce_message? as u64),
        ))
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub guild_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub recipient_id: i64,
    pub address: Option<String>,
    pub pending_nudge: bool,
    pub dm_channel: Option<i64>,
    pub message_id: Option<i64>,
}

impl ParticipantRow {
    pub fn new(guild_id: u64, participant: &Participant, recipient: UserId) -> Self {
        Self {
            guild_id: guild_id as i64,
            user_id: participant.user_id.0 as i64,
            display_name: participant.display_name.clone(),
            recipient_id: recipient.0 as i64,
            address: participant.address.clone(),
            pending_nudge: participant.pending_nudge,
            dm_channel: participant.invitation.map(|i| i.channel_id.0 as i64),
            message_id: participant.invitation.map(|i| i.message_id.0 as i64),
        }
    }

    pub fn recipient(&self) -> UserId {
        UserId(self.recipient_id as u64)
    }

    pub fn into_participant(self) -> Participant {
        let invitation = match (self.dm_channel, self.message_id) {
            (Some(channel), Some(message)) => Some(InvitationRef {
                channel_id: ChannelId(channel as u64),
                message_id: MessageId(message as u64),
            }),
            _ => None,
        };

        Participant {
            user_id: UserId(self.user_id as u64),
            display_name: self.display_name,
            address: self.address,
            pending_nudge: self.pending_nudge,
            invitation,
        }
    }
}
