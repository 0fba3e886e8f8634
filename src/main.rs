use bot::start_bot;
use clap::Parser;
use config::{Args, BotEnv, Config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod birthday;
mod bot;
pub mod commands;
pub mod config;
pub mod cron;
pub mod discord;
pub mod helpers;
pub mod i18n;
pub mod models;
pub mod persistence;
pub mod santa;
pub mod structs;
#[cfg(test)]
mod test_utils;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,serenity=warn,sqlx=warn")),
        )
        .with(fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine, the variables may come from the environment
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let env_config: BotEnv = envy::from_env()?;
    let config = Config::new(env_config, args);

    info!("Starting community bot v{}", env!("CARGO_PKG_VERSION"));
    start_bot(config).await
}
