//! IRC session state, kept free of any I/O so that it can be driven by tests as well as by the
//! real connection.

use irc_proto::{Command, Message, Response};
use tracing::{debug, trace};

use crate::{
    bot::handlers,
    config::{ChannelConfig, Delivery, IrcConfig},
    queue::Notification,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not connected, and not trying to: initial state, or after quitting.
    Disconnected,
    /// Connected to the server, registration not complete yet.
    Connecting,
    /// Registered, channels have been joined.
    Connected,
    /// The connection was lost, waiting before the next attempt.
    Reconnecting,
}

/// Server messages the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Ping,
    Welcome,
    NicknameInUse,
    Nick,
    Join,
    Kick,
    Error,
}

impl Event {
    fn of(command: &Command) -> Option<Self> {
        let event = match command {
            Command::PING(..) => Self::Ping,
            Command::Response(Response::RPL_WELCOME, _) => Self::Welcome,
            Command::Response(Response::ERR_NICKNAMEINUSE, _) => Self::NicknameInUse,
            Command::NICK(_) => Self::Nick,
            Command::JOIN(..) => Self::Join,
            Command::KICK(..) => Self::Kick,
            Command::ERROR(_) => Self::Error,
            _ => return None,
        };
        Some(event)
    }
}

/// Reaction to an incoming message, returning the messages to send back.
type Handler = fn(&mut Session, &Message) -> Vec<Message>;

const HANDLERS: &[(Event, Handler)] = &[
    (Event::Ping, handlers::pong),
    (Event::Welcome, handlers::welcome),
    (Event::NicknameInUse, handlers::nickname_in_use),
    (Event::Nick, handlers::nick_changed),
    (Event::Join, handlers::joined),
    (Event::Kick, handlers::rejoin_after_kick),
    (Event::Error, handlers::server_error),
];

#[derive(Debug)]
pub struct Session {
    pub(super) config: IrcConfig,
    pub(super) state: State,
    /// Nickname the server currently knows us by.
    pub(super) nickname: String,
    pub(super) joined: Vec<String>,
}

impl Session {
    pub fn new(config: IrcConfig) -> Self {
        let nickname = config.nickname.clone();
        Self {
            config,
            state: State::Disconnected,
            nickname,
            joined: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Starts a new connection attempt, returning the registration messages.
    pub fn connect(&mut self) -> Vec<Message> {
        self.state = State::Connecting;
        self.nickname = self.config.nickname.clone();
        self.joined.clear();

        let mut messages = Vec::with_capacity(3);
        if let Some(password) = &self.config.password {
            messages.push(Command::PASS(password.clone()).into());
        }
        messages.push(Command::NICK(self.nickname.clone()).into());
        messages.push(
            Command::USER(
                self.config.username().to_owned(),
                "0".to_owned(),
                self.config.realname.clone(),
            )
            .into(),
        );
        messages
    }

    pub fn handle(&mut self, message: &Message) -> Vec<Message> {
        let handler = Event::of(&message.command).and_then(|event| {
            HANDLERS
                .iter()
                .find(|(handled, _)| *handled == event)
                .map(|&(_, handler)| handler)
        });

        match handler {
            Some(handler) => handler(self, message),
            None => {
                trace!("unhandled message: {:?}", message.command);
                Vec::new()
            }
        }
    }

    pub fn connection_lost(&mut self) {
        self.state = State::Reconnecting;
        self.joined.clear();
    }

    /// Messages posting `notification` to the channels that want it. Nothing is posted unless
    /// registration is complete.
    pub fn deliver(&self, notification: &Notification) -> Vec<Message> {
        if self.state != State::Connected {
            debug!(
                "not connected ({:?}), dropping notification `{}`",
                self.state, notification.text
            );
            return Vec::new();
        }

        self.config
            .channels
            .iter()
            .filter(|channel| channel.wants(&notification.repo))
            .map(|channel| {
                let target = channel.name.clone();
                let text = notification.text.clone();
                match self.config.delivery {
                    Delivery::Notice => Command::NOTICE(target, text).into(),
                    Delivery::Privmsg => Command::PRIVMSG(target, text).into(),
                }
            })
            .collect()
    }

    /// Leaves the network. Returns the `QUIT` message to send if there is a connection to send
    /// it on.
    pub fn quit(&mut self) -> Option<Message> {
        let connected = matches!(self.state, State::Connecting | State::Connected);
        self.state = State::Disconnected;
        self.joined.clear();

        connected.then(|| Command::QUIT(Some(self.config.quit_message.clone())).into())
    }

    pub(super) fn is_me(&self, nickname: &str) -> bool {
        nickname.eq_ignore_ascii_case(&self.nickname)
    }

    pub(super) fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.config
            .channels
            .iter()
            .find(|channel| channel.name.eq_ignore_ascii_case(name))
    }

    pub(super) fn join_all(&self) -> Vec<Message> {
        self.config.channels.iter().map(join).collect()
    }
}

pub(super) fn join(channel: &ChannelConfig) -> Message {
    Command::JOIN(channel.name.clone(), channel.key.clone(), None).into()
}
