//! STOMP command verbs.
//!
//! Client commands initiate work (CONNECT, SEND, SUBSCRIBE, ...); server
//! commands are what a broker sends back (CONNECTED, MESSAGE, RECEIPT,
//! ERROR). The set is fixed by the protocol.

use crate::error::FrameError;

/// A STOMP frame command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // Client commands
    Connect,
    Send,
    Subscribe,
    Unsubscribe,
    Begin,
    Commit,
    Abort,
    Ack,
    Disconnect,
    // Server commands
    Connected,
    Message,
    Receipt,
    Error,
}

impl Command {
    /// The uppercase wire form of this command.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Begin => "BEGIN",
            Command::Commit => "COMMIT",
            Command::Abort => "ABORT",
            Command::Ack => "ACK",
            Command::Disconnect => "DISCONNECT",
            Command::Connected => "CONNECTED",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }

    /// Returns true if this command is sent by clients.
    pub fn is_client_command(self) -> bool {
        !self.is_server_command()
    }

    /// Returns true if this command is sent by brokers.
    pub fn is_server_command(self) -> bool {
        matches!(
            self,
            Command::Connected | Command::Message | Command::Receipt | Command::Error
        )
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Command {
    type Err = FrameError;

    /// Commands match their exact uppercase wire form only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Command::Connect),
            "SEND" => Ok(Command::Send),
            "SUBSCRIBE" => Ok(Command::Subscribe),
            "UNSUBSCRIBE" => Ok(Command::Unsubscribe),
            "BEGIN" => Ok(Command::Begin),
            "COMMIT" => Ok(Command::Commit),
            "ABORT" => Ok(Command::Abort),
            "ACK" => Ok(Command::Ack),
            "DISCONNECT" => Ok(Command::Disconnect),
            "CONNECTED" => Ok(Command::Connected),
            "MESSAGE" => Ok(Command::Message),
            "RECEIPT" => Ok(Command::Receipt),
            "ERROR" => Ok(Command::Error),
            other => Err(FrameError::UnknownCommand(other.to_string())),
        }
    }
}
