use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default = "default_storage_config")]
    pub storage: StorageConfig,
    #[serde(default = "default_links_config")]
    pub links: LinksConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Chat where submissions are sent for review: either the moderator's
    /// own user id (private chat) or a moderation group's id.
    pub moderator_chat_id: i64,
    /// Channel that accepted submissions are published to.
    pub channel_id: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
}

/// The two hyperlinks appended to every published post.
#[derive(Debug, Deserialize, Clone)]
pub struct LinksConfig {
    #[serde(default = "default_bot_url")]
    pub bot_url: String,
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("userdata.db")
}

fn default_bot_url() -> String {
    "https://t.me/your_suggestion_bot".to_string()
}

fn default_chat_url() -> String {
    "https://t.me/your_chat".to_string()
}

fn default_storage_config() -> StorageConfig {
    StorageConfig {
        database_path: default_db_path(),
    }
}

fn default_links_config() -> LinksConfig {
    LinksConfig {
        bot_url: default_bot_url(),
        chat_url: default_chat_url(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// HTML footer appended to every accepted post.
    pub fn footer(&self) -> String {
        format!(
            "\n\n<a href=\"{}\">Ссылка на предложку</a>\n<a href=\"{}\">Ссылка на чат</a>",
            self.links.bot_url, self.links.chat_url
        )
    }
}
