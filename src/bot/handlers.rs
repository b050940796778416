use irc_proto::{Command, Message};
use tracing::{debug, info, warn};

use crate::bot::session::{join, Session, State};

pub(super) fn pong(_session: &mut Session, message: &Message) -> Vec<Message> {
    let Command::PING(server, forward) = &message.command else {
        return Vec::new();
    };

    vec![Command::PONG(server.clone(), forward.clone()).into()]
}

/// Registration is complete: join every configured channel.
pub(super) fn welcome(session: &mut Session, message: &Message) -> Vec<Message> {
    if let Command::Response(_, args) = &message.command {
        if let Some(nickname) = args.first() {
            session.nickname = nickname.clone();
        }
    }
    session.state = State::Connected;
    info!("registered on {} as {}", session.config.server, session.nickname);

    session.join_all()
}

pub(super) fn nickname_in_use(session: &mut Session, _message: &Message) -> Vec<Message> {
    if session.state != State::Connecting {
        return Vec::new();
    }

    let nickname = format!("{}_", session.nickname);
    warn!(
        "nickname {} is already in use, trying {}",
        session.nickname, nickname
    );
    session.nickname = nickname;

    vec![Command::NICK(session.nickname.clone()).into()]
}

pub(super) fn nick_changed(session: &mut Session, message: &Message) -> Vec<Message> {
    let (Some(old), Command::NICK(new)) = (message.source_nickname(), &message.command) else {
        return Vec::new();
    };

    if session.is_me(old) {
        info!("nickname changed from {} to {}", old, new);
        session.nickname = new.clone();
    }

    Vec::new()
}

pub(super) fn joined(session: &mut Session, message: &Message) -> Vec<Message> {
    let (Some(nickname), Command::JOIN(channel, ..)) =
        (message.source_nickname(), &message.command)
    else {
        return Vec::new();
    };

    if session.is_me(nickname) {
        info!("joined {}", channel);
        if !session.joined.iter().any(|c| c.eq_ignore_ascii_case(channel)) {
            session.joined.push(channel.clone());
        }
    }

    Vec::new()
}

/// Being kicked from one of our channels only costs a `JOIN`, not a reconnection.
pub(super) fn rejoin_after_kick(session: &mut Session, message: &Message) -> Vec<Message> {
    let Command::KICK(channel, kicked, reason) = &message.command else {
        return Vec::new();
    };

    if !session.is_me(kicked) {
        return Vec::new();
    }

    session.joined.retain(|c| !c.eq_ignore_ascii_case(channel));

    match session.channel(channel) {
        Some(config) => {
            warn!(
                "kicked from {} by {}: {}, joining again",
                channel,
                message.source_nickname().unwrap_or("server"),
                reason.as_deref().unwrap_or_default()
            );
            vec![join(config)]
        }
        None => {
            debug!("kicked from unconfigured channel {}", channel);
            Vec::new()
        }
    }
}

pub(super) fn server_error(_session: &mut Session, message: &Message) -> Vec<Message> {
    if let Command::ERROR(reason) = &message.command {
        warn!("server is closing the connection: {}", reason);
    }
    Vec::new()
}
