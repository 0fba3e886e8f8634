use clap::Parser;
use serde::Deserialize;

fn default_database_url() -> String {
    "sqlite://community-bot.db".to_owned()
}

/// Settings read from the environment (and `.env`).
#[derive(Deserialize)]
pub struct BotEnv {
    pub discord_token: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Register commands in this guild only, handy while developing.
    pub development_guild: Option<u64>,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Database to load from and save to, overrides DATABASE_URL
    #[arg(short, long)]
    pub database_url: Option<String>,

    /// Register slash commands in this guild instead of globally
    #[arg(long)]
    pub register_in: Option<u64>,
}

pub struct Config {
    pub token: String,
    pub database_url: String,
    pub register_in: Option<u64>,
}

impl Config {
    pub fn new(env: BotEnv, args: Args) -> Self {
        Self {
            token: env.discord_token,
            database_url: args.database_url.unwrap_or(env.database_url),
            register_in: args.register_in.or(env.development_guild),
        }
    }
}
