use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod bot;
use bot::Bot;

mod config;
use config::GhircConfig;

mod format;
use format::Formatter;

mod queue;
use queue::notification_queue;

mod shortener;
use shortener::LinkShortener;

mod webhooks;
use webhooks::{build_rocket, GitHubSecret, WebhookRelay};

/// How long the bot gets to say goodbye once the HTTP server stopped
const QUIT_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(version, about = "Relays GitHub webhooks to IRC channels")]
struct Opts {
    /// Configuration file for ghirc
    #[arg(short, long)]
    config: PathBuf,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    let config_file = File::open(&opts.config)
        .with_context(|| format!("couldn't open {}:", opts.config.display()))?;
    let config: GhircConfig = serde_yaml::from_reader(BufReader::new(config_file))
        .context("couldn't parse config file")?;
    config.validate().context("invalid config file")?;

    let shortener = config
        .link_shortener
        .clone()
        .map(LinkShortener::new)
        .transpose()
        .context("failed to create link shortener")?;
    let formatter = Formatter::new(config.theme.clone(), shortener);

    let (sender, receiver) = notification_queue(config.queue_capacity);
    let relay = WebhookRelay::new(sender, formatter);
    let github_secret = GitHubSecret(config.github_secret.clone());

    let (stop_bot, shutdown) = oneshot::channel();
    let bot = tokio::spawn(Bot::new(config.irc.clone()).run(receiver, shutdown));

    let figment = rocket::Config::figment()
        .merge(("address", config.http_address.ip()))
        .merge(("port", config.http_address.port()));
    info!("listening for webhooks on {}", config.http_address);

    // rocket stops on ctrl-c, the bot is told to quit once it did
    let served = build_rocket(figment, relay, github_secret)
        .launch()
        .await
        .map(|_| ())
        .map_err(|err| anyhow::anyhow!(err));

    let _ = stop_bot.send(());
    if tokio::time::timeout(QUIT_GRACE_PERIOD, bot).await.is_err() {
        warn!("bot didn't stop in time, leaving anyway");
    }

    served
}
