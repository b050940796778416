use std::time::Duration;

use anyhow::Context;
use futures::{SinkExt, StreamExt};
use irc_proto::Message;
use tokio::{net::TcpStream, time::timeout};
use tokio_util::codec::{AnyDelimiterCodec, Framed};
use tracing::{debug, trace};

/// Longest line accepted from the server, message tags included.
pub(super) const MAX_LINE_LENGTH: usize = 8191;

/// Line-based transport to the IRC server.
pub(super) struct Connection {
    framed: Framed<TcpStream, AnyDelimiterCodec>,
    write_timeout: Duration,
}

impl Connection {
    pub(super) async fn connect(
        server: &str,
        port: u16,
        write_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let stream = timeout(write_timeout, TcpStream::connect((server, port)))
            .await
            .context("timed out connecting")??;

        // lines end with CRLF, but some servers only send LF
        let codec = AnyDelimiterCodec::new_with_max_length(
            b"\n".to_vec(),
            b"\r\n".to_vec(),
            MAX_LINE_LENGTH,
        );

        Ok(Self {
            framed: Framed::new(stream, codec),
            write_timeout,
        })
    }

    /// Reads the next message, or `None` once the server closed the connection.
    ///
    /// This is cancel safe: a partially received line stays buffered until the next call. A line
    /// longer than [`MAX_LINE_LENGTH`] is an error.
    pub(super) async fn read_message(&mut self) -> anyhow::Result<Option<Message>> {
        loop {
            let chunk = match self.framed.next().await {
                Some(chunk) => chunk.context("couldn't read from the server")?,
                None => return Ok(None),
            };

            // servers aren't required to send UTF-8
            let line = String::from_utf8_lossy(&chunk);
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }

            match line.parse::<Message>() {
                Ok(message) => {
                    trace!("<- {}", line);
                    return Ok(Some(message));
                }
                Err(e) => debug!("ignoring malformed line {:?}: {}", line, e),
            }
        }
    }

    pub(super) async fn send(&mut self, message: &Message) -> anyhow::Result<()> {
        let line = message.to_string();
        // the codec adds the line ending
        let line = line.trim_end_matches(['\r', '\n']);
        trace!("-> {}", line);

        timeout(self.write_timeout, self.framed.send(line))
            .await
            .context("timed out writing to the server")??;

        Ok(())
    }

    pub(super) async fn close(mut self) {
        if let Err(e) = SinkExt::<&str>::close(&mut self.framed).await {
            debug!("couldn't close connection cleanly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use irc_proto::Command;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn connected() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connection = Connection::connect("127.0.0.1", port, TIMEOUT).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (connection, server)
    }

    async fn read(connection: &mut Connection) -> anyhow::Result<Option<Message>> {
        timeout(TIMEOUT, connection.read_message())
            .await
            .expect("a message or an error")
    }

    #[tokio::test]
    async fn reads_lines_with_either_ending() {
        let (mut connection, mut server) = connected().await;

        server
            .write_all(b"\r\nPING :one\r\nPING :two\nPRIVMSG #a :caf\xe9\r\n")
            .await
            .unwrap();

        let message = read(&mut connection).await.unwrap().unwrap();
        assert_eq!(message.command, Command::PING("one".to_owned(), None));
        let message = read(&mut connection).await.unwrap().unwrap();
        assert_eq!(message.command, Command::PING("two".to_owned(), None));
        let message = read(&mut connection).await.unwrap().unwrap();
        assert_eq!(
            message.command,
            Command::PRIVMSG("#a".to_owned(), "caf\u{FFFD}".to_owned())
        );

        drop(server);
        assert!(read(&mut connection).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_line_is_an_error() {
        let (mut connection, mut server) = connected().await;

        let writer = tokio::spawn(async move {
            let mut line = b"PING :".to_vec();
            line.resize(line.len() + 8 * 1024 * 1024, b'a');
            line.extend_from_slice(b"\r\n");
            // the bot hangs up long before all of it is sent
            let _ = server.write_all(&line).await;
        });

        assert!(read(&mut connection).await.is_err());
        drop(connection);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn longest_line_is_accepted() {
        let (mut connection, mut server) = connected().await;

        // the limit counts the carriage return, not the line feed
        let mut line = "PING :".to_owned();
        line.push_str(&"a".repeat(MAX_LINE_LENGTH - 1 - line.len()));
        line.push_str("\r\n");
        server.write_all(line.as_bytes()).await.unwrap();

        let message = read(&mut connection).await.unwrap().unwrap();
        assert!(matches!(
            &message.command,
            Command::PING(token, None) if token.len() == MAX_LINE_LENGTH - 7
        ));
    }

    #[tokio::test]
    async fn sent_messages_end_with_crlf() {
        let (mut connection, mut server) = connected().await;

        let quit = Message::from(Command::QUIT(Some("bye now".to_owned())));
        connection.send(&quit).await.unwrap();
        connection.close().await;

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "QUIT :bye now\r\n");
    }
}
