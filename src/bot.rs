use std::time::Duration;

use anyhow::Context;
use irc_proto::Message;
use tokio::{sync::oneshot, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    config::IrcConfig,
    queue::{Notification, NotificationReceiver},
};

mod connection;
use connection::Connection;

mod handlers;

mod session;
use session::Session;

/// Why a connection ended.
enum Exit {
    Shutdown,
    Disconnected,
}

/// Whatever woke the bot up.
enum Input {
    Shutdown,
    Message(anyhow::Result<Option<Message>>),
    Notification(Option<Notification>),
}

/// IRC bot posting queued notifications.
///
/// A single task owns the connection: replies to the server, joins and notifications are all
/// written from [`Bot::run`], one at a time.
pub struct Bot {
    session: Session,
    server: String,
    port: u16,
    reconnect_interval: Duration,
    write_timeout: Duration,
}

impl Bot {
    pub fn new(config: IrcConfig) -> Self {
        Self {
            server: config.server.clone(),
            port: config.port,
            reconnect_interval: config.reconnect_interval(),
            write_timeout: config.write_timeout(),
            session: Session::new(config),
        }
    }

    /// Connects to the server and delivers notifications until `shutdown` fires, or every
    /// [`crate::queue::NotificationSender`] is dropped.
    ///
    /// Lost connections are retried forever.
    pub async fn run(
        mut self,
        mut notifications: NotificationReceiver,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        debug!("running...");

        loop {
            match self.serve(&mut notifications, &mut shutdown).await {
                Ok(Exit::Shutdown) => break,
                Ok(Exit::Disconnected) => {
                    warn!("connection to {}:{} was closed", self.server, self.port)
                }
                Err(e) => warn!(
                    "lost connection to {}:{}: {:#}",
                    self.server, self.port, e
                ),
            }

            self.session.connection_lost();
            debug!("session is now {:?}", self.session.state());
            info!("reconnecting in {}s", self.reconnect_interval.as_secs());
            if !self
                .wait_before_reconnect(&mut notifications, &mut shutdown)
                .await
            {
                break;
            }
        }

        info!("bot stopped");
    }

    async fn serve(
        &mut self,
        notifications: &mut NotificationReceiver,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> anyhow::Result<Exit> {
        let registration = self.session.connect();

        info!("connecting to {}:{}", self.server, self.port);
        let mut connection = tokio::select! {
            biased;
            _ = &mut *shutdown => return Ok(Exit::Shutdown),
            connection = Connection::connect(&self.server, self.port, self.write_timeout) => {
                connection.context("couldn't connect")?
            }
        };

        for message in registration {
            connection.send(&message).await?;
        }

        loop {
            let input = next_input(&mut connection, notifications, shutdown).await;

            match input {
                Input::Shutdown | Input::Notification(None) => {
                    self.quit(connection).await;
                    return Ok(Exit::Shutdown);
                }
                Input::Message(message) => {
                    let message = match message? {
                        Some(message) => message,
                        None => return Ok(Exit::Disconnected),
                    };
                    for reply in self.session.handle(&message) {
                        connection.send(&reply).await?;
                    }
                }
                Input::Notification(Some(notification)) => {
                    for message in self.session.deliver(&notification) {
                        connection.send(&message).await?;
                    }
                }
            }
        }
    }

    /// Sleeps until the next connection attempt. Notifications received meanwhile are dropped.
    ///
    /// Returns `false` if the bot should stop instead.
    async fn wait_before_reconnect(
        &mut self,
        notifications: &mut NotificationReceiver,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> bool {
        let delay = sleep(self.reconnect_interval);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut *shutdown => return false,
                _ = &mut delay => return true,
                notification = notifications.dequeue() => match notification {
                    // not connected, this only logs and drops it
                    Some(notification) => {
                        self.session.deliver(&notification);
                    }
                    None => return false,
                },
            }
        }
    }

    /// Best effort: the process is going away whether the server hears about it or not.
    async fn quit(&mut self, mut connection: Connection) {
        if let Some(quit) = self.session.quit() {
            info!(
                "{} is quitting: {}",
                self.session.nickname(),
                self.session.config.quit_message
            );
            if let Err(e) = connection.send(&quit).await {
                warn!("couldn't send QUIT: {:#}", e);
            }
        }
        connection.close().await;
    }
}

/// Waits for whatever comes first. Server messages go before notifications, so that PINGs are
/// answered in time even with a full queue.
async fn next_input(
    connection: &mut Connection,
    notifications: &mut NotificationReceiver,
    shutdown: &mut oneshot::Receiver<()>,
) -> Input {
    tokio::select! {
        biased;
        _ = &mut *shutdown => Input::Shutdown,
        message = connection.read_message() => Input::Message(message),
        notification = notifications.dequeue() => Input::Notification(notification),
    }
}
