use std::{net::SocketAddr, time::Duration};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::format::ColorTheme;

const DEFAULT_LINK_SHORTENER: &str = "https://git.io";

#[derive(Debug, Clone, Deserialize)]
pub struct GhircConfig {
    /// Secret shared with GitHub, used to validate webhook signatures
    pub github_secret: String,
    /// Address the webhook HTTP server listens on
    #[serde(default = "default_http_address")]
    pub http_address: SocketAddr,
    /// How many formatted notifications may wait for delivery before webhook requests start
    /// waiting for room in the queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Endpoint used to shorten links in notifications. Set to `~` to always post full links.
    #[serde(default = "default_link_shortener")]
    pub link_shortener: Option<Url>,
    #[serde(default)]
    pub theme: ColorTheme,
    pub irc: IrcConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    /// Hostname of the IRC server
    pub server: String,
    #[serde(default = "default_irc_port")]
    pub port: u16,
    pub nickname: String,
    /// Defaults to the nickname
    pub username: Option<String>,
    #[serde(default = "default_realname")]
    pub realname: String,
    /// Server password, sent with `PASS` before registering
    pub password: Option<String>,
    /// Channels the bot joins and posts to, in join order
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub delivery: Delivery,
    /// Seconds to wait before reconnecting after the connection was lost
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval: u64,
    /// Seconds a single outbound line may take to be written before the connection is
    /// considered dead
    #[serde(default = "default_write_timeout")]
    pub write_timeout: u64,
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
}

impl IrcConfig {
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nickname)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub key: Option<String>,
    /// Only announce events from repositories whose name matches. Every repository is announced
    /// when unset.
    #[serde(default, with = "serde_regex")]
    pub repos: Option<Regex>,
}

impl ChannelConfig {
    pub fn wants(&self, repo: &str) -> bool {
        self.repos
            .as_ref()
            .map_or(true, |filter| filter.is_match(repo))
    }
}

/// IRC command used to post notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    #[default]
    Notice,
    Privmsg,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{0}` must not be empty")]
    Empty(&'static str),
    #[error("`queue_capacity` must be at least 1")]
    QueueCapacity,
    #[error("`{0}` is not a valid channel name")]
    ChannelName(String),
    #[error("`{0}` must not contain spaces or line breaks")]
    Whitespace(&'static str),
    #[error("key of `{0}` must be a single word")]
    ChannelKey(String),
}

impl GhircConfig {
    /// Checks what serde can't: the bot can't do anything useful without these.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github_secret.is_empty() {
            return Err(ConfigError::Empty("github_secret"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }

        let irc = &self.irc;
        if irc.server.is_empty() {
            return Err(ConfigError::Empty("irc.server"));
        }
        if irc.nickname.is_empty() {
            return Err(ConfigError::Empty("irc.nickname"));
        }
        if irc.nickname.contains(char::is_whitespace) {
            return Err(ConfigError::Whitespace("irc.nickname"));
        }
        if irc.username().contains(char::is_whitespace) {
            return Err(ConfigError::Whitespace("irc.username"));
        }
        if irc.realname.contains(['\r', '\n']) {
            return Err(ConfigError::Whitespace("irc.realname"));
        }
        if irc.channels.is_empty() {
            return Err(ConfigError::Empty("irc.channels"));
        }
        for channel in &irc.channels {
            let valid = channel.name.starts_with(['#', '&'])
                && !channel.name.contains([' ', ',', '\x07', '\r', '\n']);
            if !valid {
                return Err(ConfigError::ChannelName(channel.name.clone()));
            }
            // keys go in the middle of a JOIN line
            let key_valid = channel.key.as_deref().map_or(true, |key| {
                !key.is_empty() && !key.contains(char::is_whitespace) && !key.contains(',')
            });
            if !key_valid {
                return Err(ConfigError::ChannelKey(channel.name.clone()));
            }
        }

        Ok(())
    }
}

fn default_http_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 1337))
}

fn default_queue_capacity() -> usize {
    10
}

fn default_link_shortener() -> Option<Url> {
    Url::parse(DEFAULT_LINK_SHORTENER).ok()
}

fn default_irc_port() -> u16 {
    6667
}

fn default_realname() -> String {
    "GitHub notifier".to_owned()
}

fn default_reconnect_interval() -> u64 {
    60
}

fn default_write_timeout() -> u64 {
    30
}

fn default_quit_message() -> String {
    "Shutting down".to_owned()
}
