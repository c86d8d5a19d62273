use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Origins allowed to call the relay from a browser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedOrigins {
    /// The allow-list is exactly `*`.
    #[default]
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parse a comma-separated allow-list. An empty string means wildcard;
    /// otherwise entries are trimmed and empties dropped, so a value made of
    /// separators only allows no origin at all.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return AllowedOrigins::Any;
        }
        let entries: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        Self::from_entries(entries)
    }

    /// Exactly `["*"]` is the wildcard; anything else, empty included, is
    /// taken literally.
    pub fn from_entries(entries: Vec<String>) -> Self {
        match entries.as_slice() {
            [only] if only == "*" => AllowedOrigins::Any,
            _ => AllowedOrigins::List(entries),
        }
    }
}

impl<'de> Deserialize<'de> for AllowedOrigins {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Csv(String),
            List(Vec<String>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Csv(s) => AllowedOrigins::parse(&s),
            Raw::List(list) => AllowedOrigins::from_entries(
                list.into_iter()
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
        })
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_api_base(),
        }
    }
}

/// Bot token and destination chat, both present and non-empty.
#[derive(Debug, Clone, Copy)]
pub struct TelegramCredentials<'a> {
    pub bot_token: &'a str,
    pub chat_id: &'a str,
}

impl TelegramConfig {
    pub fn credentials(&self) -> Option<TelegramCredentials<'_>> {
        let bot_token = self.bot_token.as_deref().filter(|s| !s.is_empty())?;
        let chat_id = self.chat_id.as_deref().filter(|s| !s.is_empty())?;
        Some(TelegramCredentials { bot_token, chat_id })
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: AllowedOrigins,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Upper bound when draining an unparsed request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Config {
    /// Load the optional TOML file, then apply environment overrides.
    /// A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay values taken from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(base) = lookup("TELEGRAM_API_BASE").filter(|s| !s.is_empty()) {
            self.telegram.api_base = base;
        }
        // Empty means unset, as for the other keys.
        if let Some(origins) = lookup("ALLOWED_ORIGINS").filter(|s| !s.is_empty()) {
            self.cors.allowed_origins = AllowedOrigins::parse(&origins);
        }
        if let Some(addr) = lookup("BIND_ADDRESS").filter(|s| !s.is_empty()) {
            self.server.bind_address = addr;
        }
        if let Some(limit) = lookup("MAX_BODY_BYTES").and_then(|s| s.trim().parse().ok()) {
            self.server.max_body_bytes = limit;
        }
    }
}
