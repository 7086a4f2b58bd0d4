use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// STOMP protocol versions this crate speaks.
///
/// Versions are ordered, so the highest common version of a client/server
/// pair can be picked with ordinary comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    V1_0,
    V1_1,
    V1_2,
}

impl Version {
    /// All supported versions, lowest first.
    pub const ALL: [Version; 3] = [Version::V1_0, Version::V1_1, Version::V1_2];

    pub fn as_str(self) -> &'static str {
        match self {
            Version::V1_0 => "1.0",
            Version::V1_1 => "1.1",
            Version::V1_2 => "1.2",
        }
    }

    /// Heart-beating was introduced with STOMP 1.1.
    pub fn supports_heart_beat(self) -> bool {
        self != Version::V1_0
    }

    /// 1.1 and 1.2 allow CRLF line endings; a trailing CR before the LF is
    /// line-terminator dressing, not data. In 1.0 a CR is a literal byte.
    pub(crate) fn strips_trailing_cr(self) -> bool {
        self != Version::V1_0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Version {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(Version::V1_0),
            "1.1" => Ok(Version::V1_1),
            "1.2" => Ok(Version::V1_2),
            other => Err(ProtocolError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// STOMP command names.
pub mod command {
    pub const ABORT: &str = "ABORT";
    pub const ACK: &str = "ACK";
    pub const BEGIN: &str = "BEGIN";
    pub const COMMIT: &str = "COMMIT";
    pub const CONNECT: &str = "CONNECT";
    pub const CONNECTED: &str = "CONNECTED";
    pub const DISCONNECT: &str = "DISCONNECT";
    pub const ERROR: &str = "ERROR";
    pub const MESSAGE: &str = "MESSAGE";
    pub const NACK: &str = "NACK";
    pub const RECEIPT: &str = "RECEIPT";
    pub const SEND: &str = "SEND";
    pub const STOMP: &str = "STOMP";
    pub const SUBSCRIBE: &str = "SUBSCRIBE";
    pub const UNSUBSCRIBE: &str = "UNSUBSCRIBE";
}

/// Well-known STOMP header names.
pub mod header {
    pub const ACCEPT_VERSION: &str = "accept-version";
    pub const ACK: &str = "ack";
    pub const CONTENT_LENGTH: &str = "content-length";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const DESTINATION: &str = "destination";
    pub const HEART_BEAT: &str = "heart-beat";
    pub const HOST: &str = "host";
    pub const ID: &str = "id";
    pub const LOGIN: &str = "login";
    pub const MESSAGE_ID: &str = "message-id";
    pub const PASSCODE: &str = "passcode";
    pub const RECEIPT: &str = "receipt";
    pub const RECEIPT_ID: &str = "receipt-id";
    pub const SERVER: &str = "server";
    pub const SESSION: &str = "session";
    pub const SUBSCRIPTION: &str = "subscription";
    pub const TRANSACTION: &str = "transaction";
    pub const VERSION: &str = "version";
}

const CLIENT_COMMANDS_1_0: &[&str] = &[
    command::ABORT,
    command::ACK,
    command::BEGIN,
    command::COMMIT,
    command::CONNECT,
    command::DISCONNECT,
    command::SEND,
    command::SUBSCRIBE,
    command::UNSUBSCRIBE,
];

const CLIENT_COMMANDS_1_1: &[&str] = &[
    command::ABORT,
    command::ACK,
    command::BEGIN,
    command::COMMIT,
    command::CONNECT,
    command::DISCONNECT,
    command::NACK,
    command::SEND,
    command::STOMP,
    command::SUBSCRIBE,
    command::UNSUBSCRIBE,
];

const SERVER_COMMANDS: &[&str] = &[
    command::CONNECTED,
    command::ERROR,
    command::MESSAGE,
    command::RECEIPT,
];

/// Commands a client may emit under the given version. NACK and STOMP do
/// not exist in 1.0.
pub fn client_commands(version: Version) -> &'static [&'static str] {
    match version {
        Version::V1_0 => CLIENT_COMMANDS_1_0,
        Version::V1_1 | Version::V1_2 => CLIENT_COMMANDS_1_1,
    }
}

/// Commands a broker may emit (identical across versions).
pub fn server_commands() -> &'static [&'static str] {
    SERVER_COMMANDS
}

/// Whether `name` is a valid command under `version`, in either direction.
pub fn is_command(version: Version, name: &str) -> bool {
    client_commands(version).contains(&name) || SERVER_COMMANDS.contains(&name)
}

/// Only SEND, MESSAGE and ERROR may carry a body.
pub fn body_allowed(command_name: &str) -> bool {
    matches!(
        command_name,
        command::SEND | command::MESSAGE | command::ERROR
    )
}

/// Header escaping never applies to connect-phase frames, and 1.0 has no
/// escaping at all.
pub fn escape_excluded(version: Version, command_name: &str) -> bool {
    version == Version::V1_0
        || matches!(
            command_name,
            command::CONNECT | command::STOMP | command::CONNECTED
        )
}

/// Subscription acknowledgement modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    #[default]
    Auto,
    Client,
    ClientIndividual,
}

impl AckMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::ClientIndividual => "client-individual",
        }
    }

    /// Parse an `ack` header value; `None` for anything outside the three
    /// modes the protocol defines.
    pub fn from_header(value: &str) -> Option<AckMode> {
        match value {
            "auto" => Some(AckMode::Auto),
            "client" => Some(AckMode::Client),
            "client-individual" => Some(AckMode::ClientIndividual),
            _ => None,
        }
    }
}

impl fmt::Display for AckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_ordered() {
        assert!(Version::V1_0 < Version::V1_1);
        assert!(Version::V1_1 < Version::V1_2);
        assert_eq!("1.2".parse::<Version>().unwrap(), Version::V1_2);
        assert!("2.0".parse::<Version>().is_err());
    }

    #[test]
    fn nack_and_stomp_missing_from_1_0() {
        assert!(!is_command(Version::V1_0, command::NACK));
        assert!(!is_command(Version::V1_0, command::STOMP));
        assert!(is_command(Version::V1_1, command::NACK));
        assert!(is_command(Version::V1_2, command::STOMP));
        assert!(is_command(Version::V1_0, command::MESSAGE));
    }

    #[test]
    fn connect_frames_never_escaped() {
        for version in Version::ALL {
            assert!(escape_excluded(version, command::CONNECT));
            assert!(escape_excluded(version, command::CONNECTED));
            assert!(escape_excluded(version, command::STOMP));
        }
        assert!(escape_excluded(Version::V1_0, command::SEND));
        assert!(!escape_excluded(Version::V1_1, command::SEND));
        assert!(!escape_excluded(Version::V1_2, command::MESSAGE));
    }

    #[test]
    fn ack_mode_round_trips() {
        for mode in [AckMode::Auto, AckMode::Client, AckMode::ClientIndividual] {
            assert_eq!(AckMode::from_header(mode.as_str()), Some(mode));
        }
        assert_eq!(AckMode::from_header("bogus"), None);
    }
}
