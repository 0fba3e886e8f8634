use std::{sync::Arc, time::Instant};

use tokio::sync::watch;

use crate::{discord::DiscordHttp, i18n::Translator, persistence::QueryHandler, santa::SecretSanta};

pub struct Data {
    pub query_handler: QueryHandler,
    pub santa: SecretSanta,
    pub discord: DiscordHttp,
    pub translator: Arc<Translator>,
    pub shutdown: watch::Sender<bool>,
    pub started: Instant,
} // User data, which is stored and accessible in all command invocations

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
