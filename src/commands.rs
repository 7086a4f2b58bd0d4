//! Stateless constructors for every client command, plus interpreters for
//! the four server frames. Nothing here touches a socket or remembers
//! anything between calls; argument problems surface before a single byte
//! is produced. The stateful layer on top lives in [`crate::session`].

use std::fmt;

use crate::codec::StompItem;
use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::spec::{command, header, Version};

/// Identifies a subscription within a session. From 1.1 on every
/// subscription carries an `id` header; a 1.0 subscription without one is
/// keyed by destination instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionToken {
    Id(String),
    Destination(String),
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionToken::Id(id) => write!(f, "id={}", id),
            SubscriptionToken::Destination(dest) => write!(f, "destination={}", dest),
        }
    }
}

/// What a CONNECTED frame told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedHeaders {
    pub version: Version,
    pub session: Option<String>,
    pub server: Option<String>,
    /// Raw `(sx, sy)` pair from the server's `heart-beat` header; `(0, 0)`
    /// when absent or pre-1.1.
    pub heart_beat: (u32, u32),
}

fn sorted_versions(versions: &[Version]) -> Vec<Version> {
    let mut out: Vec<Version> = if versions.is_empty() {
        Version::ALL.to_vec()
    } else {
        versions.to_vec()
    };
    out.sort();
    out.dedup();
    out
}

fn version_list(versions: &[Version]) -> String {
    versions
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn add_receipt(frame: Frame, receipt: Option<&str>) -> Result<Frame, ProtocolError> {
    match receipt {
        None => Ok(frame),
        Some("") => Err(ProtocolError::InvalidCommandArguments(
            "receipt id must not be empty".to_string(),
        )),
        Some(id) => Ok(frame.header(header::RECEIPT, id)),
    }
}

fn require_header(frame: &Frame, name: &'static str) -> Result<String, ProtocolError> {
    frame
        .get_header(name)
        .map(str::to_string)
        .ok_or_else(|| ProtocolError::MissingHeader {
            command: frame.command.clone(),
            header: name,
        })
}

fn build_connect(
    cmd: &str,
    login: Option<&str>,
    passcode: Option<&str>,
    extra_headers: &[(String, String)],
    versions: &[Version],
    host: Option<&str>,
    heart_beat: Option<(u32, u32)>,
) -> Result<Frame, ProtocolError> {
    let versions = sorted_versions(versions);
    let only_1_0 = versions == [Version::V1_0];

    let mut frame = Frame::new(cmd);
    for (name, value) in extra_headers {
        frame = frame.header(name, value);
    }
    if let Some(login) = login {
        frame = frame.header(header::LOGIN, login);
    }
    if let Some(passcode) = passcode {
        frame = frame.header(header::PASSCODE, passcode);
    }
    if !only_1_0 {
        frame = frame.header(header::ACCEPT_VERSION, version_list(&versions));
        let host = host.ok_or_else(|| {
            ProtocolError::InvalidCommandArguments(
                "host header is mandatory when STOMP 1.1 or later is advertised".to_string(),
            )
        })?;
        frame = frame.header(header::HOST, host);
    }
    if let Some((cx, cy)) = heart_beat {
        if only_1_0 {
            return Err(ProtocolError::InvalidCommandArguments(
                "heart-beating requires STOMP 1.1 or later".to_string(),
            ));
        }
        frame = frame.header(header::HEART_BEAT, format!("{},{}", cx, cy));
    }
    Ok(frame)
}

/// Create a CONNECT frame. An empty `versions` slice advertises every
/// supported version.
pub fn connect(
    login: Option<&str>,
    passcode: Option<&str>,
    extra_headers: &[(String, String)],
    versions: &[Version],
    host: Option<&str>,
    heart_beat: Option<(u32, u32)>,
) -> Result<Frame, ProtocolError> {
    build_connect(
        command::CONNECT,
        login,
        passcode,
        extra_headers,
        versions,
        host,
        heart_beat,
    )
}

/// Create a STOMP frame, the 1.1+ synonym for CONNECT.
pub fn stomp(
    login: Option<&str>,
    passcode: Option<&str>,
    extra_headers: &[(String, String)],
    versions: &[Version],
    host: Option<&str>,
    heart_beat: Option<(u32, u32)>,
) -> Result<Frame, ProtocolError> {
    if sorted_versions(versions) == [Version::V1_0] {
        return Err(ProtocolError::InvalidCommandArguments(
            "the STOMP command requires STOMP 1.1 or later".to_string(),
        ));
    }
    build_connect(
        command::STOMP,
        login,
        passcode,
        extra_headers,
        versions,
        host,
        heart_beat,
    )
}

/// Create a SEND frame. `content-length` is added automatically from 1.1 on
/// when the body is non-empty and the caller did not supply one.
pub fn send(
    destination: &str,
    body: Vec<u8>,
    extra_headers: &[(String, String)],
    receipt: Option<&str>,
    version: Version,
) -> Result<Frame, ProtocolError> {
    if destination.is_empty() {
        return Err(ProtocolError::InvalidCommandArguments(
            "SEND requires a destination".to_string(),
        ));
    }
    let mut frame = Frame::new(command::SEND).header(header::DESTINATION, destination);
    for (name, value) in extra_headers {
        frame = frame.header(name, value);
    }
    if !body.is_empty()
        && version >= Version::V1_1
        && !frame.has_header(header::CONTENT_LENGTH)
    {
        frame = frame.header(header::CONTENT_LENGTH, body.len().to_string());
    }
    frame = frame.set_body(body);
    add_receipt(frame, receipt)
}

/// Create a SUBSCRIBE frame and the token to track it with. From 1.1 on the
/// caller must supply an `id` header (the session layer autogenerates one).
pub fn subscribe(
    destination: &str,
    extra_headers: &[(String, String)],
    receipt: Option<&str>,
    version: Version,
) -> Result<(Frame, SubscriptionToken), ProtocolError> {
    if destination.is_empty() {
        return Err(ProtocolError::InvalidCommandArguments(
            "SUBSCRIBE requires a destination".to_string(),
        ));
    }
    let mut frame = Frame::new(command::SUBSCRIBE).header(header::DESTINATION, destination);
    for (name, value) in extra_headers {
        frame = frame.header(name, value);
    }
    let token = match frame.get_header(header::ID) {
        Some(id) => SubscriptionToken::Id(id.to_string()),
        None => {
            if version != Version::V1_0 {
                return Err(ProtocolError::InvalidCommandArguments(format!(
                    "SUBSCRIBE requires an id header in STOMP {}",
                    version
                )));
            }
            SubscriptionToken::Destination(destination.to_string())
        }
    };
    Ok((add_receipt(frame, receipt)?, token))
}

/// Create an UNSUBSCRIBE frame for a previously issued subscription. From
/// 1.1 on only id tokens are legal; 1.0 also accepts destination tokens.
pub fn unsubscribe(
    token: &SubscriptionToken,
    receipt: Option<&str>,
    version: Version,
) -> Result<Frame, ProtocolError> {
    let frame = match token {
        SubscriptionToken::Id(id) => Frame::new(command::UNSUBSCRIBE).header(header::ID, id),
        SubscriptionToken::Destination(dest) => {
            if version != Version::V1_0 {
                return Err(ProtocolError::InvalidCommandArguments(format!(
                    "UNSUBSCRIBE requires an id header in STOMP {}",
                    version
                )));
            }
            Frame::new(command::UNSUBSCRIBE).header(header::DESTINATION, dest)
        }
    };
    add_receipt(frame, receipt)
}

fn ack_headers(message: &Frame, version: Version) -> Result<Vec<(String, String)>, ProtocolError> {
    if message.command != command::MESSAGE {
        return Err(ProtocolError::InvalidCommandArguments(format!(
            "expected a MESSAGE frame, got {}",
            message.command
        )));
    }
    let message_id = require_header(message, header::MESSAGE_ID)?;
    match version {
        Version::V1_0 => {
            let mut headers = vec![(header::MESSAGE_ID.to_string(), message_id)];
            if let Some(subscription) = message.get_header(header::SUBSCRIPTION) {
                headers.push((header::SUBSCRIPTION.to_string(), subscription.to_string()));
            }
            Ok(headers)
        }
        Version::V1_1 => {
            let subscription = require_header(message, header::SUBSCRIPTION)?;
            Ok(vec![
                (header::SUBSCRIPTION.to_string(), subscription),
                (header::MESSAGE_ID.to_string(), message_id),
            ])
        }
        Version::V1_2 => {
            // 1.2 acks by the server-assigned `ack` token alone
            let ack = require_header(message, header::ACK)?;
            Ok(vec![(header::ID.to_string(), ack)])
        }
    }
}

fn ack_or_nack(
    cmd: &str,
    message: &Frame,
    transaction: Option<&str>,
    receipt: Option<&str>,
    version: Version,
) -> Result<Frame, ProtocolError> {
    let mut frame = Frame::new(cmd);
    for (name, value) in ack_headers(message, version)? {
        frame = frame.header(name, value);
    }
    if let Some(transaction) = transaction {
        frame = frame.header(header::TRANSACTION, transaction);
    }
    add_receipt(frame, receipt)
}

/// Create an ACK frame for a received MESSAGE frame.
pub fn ack(
    message: &Frame,
    transaction: Option<&str>,
    receipt: Option<&str>,
    version: Version,
) -> Result<Frame, ProtocolError> {
    ack_or_nack(command::ACK, message, transaction, receipt, version)
}

/// Create a NACK frame for a received MESSAGE frame. Not available in 1.0.
pub fn nack(
    message: &Frame,
    transaction: Option<&str>,
    receipt: Option<&str>,
    version: Version,
) -> Result<Frame, ProtocolError> {
    if version == Version::V1_0 {
        return Err(ProtocolError::InvalidCommandArguments(
            "NACK is not available in STOMP 1.0".to_string(),
        ));
    }
    ack_or_nack(command::NACK, message, transaction, receipt, version)
}

fn transaction_frame(
    cmd: &str,
    transaction: &str,
    receipt: Option<&str>,
) -> Result<Frame, ProtocolError> {
    if transaction.is_empty() {
        return Err(ProtocolError::InvalidCommandArguments(format!(
            "{} requires a transaction id",
            cmd
        )));
    }
    add_receipt(
        Frame::new(cmd).header(header::TRANSACTION, transaction),
        receipt,
    )
}

pub fn begin(transaction: &str, receipt: Option<&str>) -> Result<Frame, ProtocolError> {
    transaction_frame(command::BEGIN, transaction, receipt)
}

pub fn commit(transaction: &str, receipt: Option<&str>) -> Result<Frame, ProtocolError> {
    transaction_frame(command::COMMIT, transaction, receipt)
}

pub fn abort(transaction: &str, receipt: Option<&str>) -> Result<Frame, ProtocolError> {
    transaction_frame(command::ABORT, transaction, receipt)
}

pub fn disconnect(receipt: Option<&str>) -> Result<Frame, ProtocolError> {
    add_receipt(Frame::new(command::DISCONNECT), receipt)
}

/// Create an outbound heart-beat. Not available in 1.0.
pub fn beat(version: Version) -> Result<StompItem, ProtocolError> {
    if !version.supports_heart_beat() {
        return Err(ProtocolError::InvalidCommandArguments(
            "heart-beating requires STOMP 1.1 or later".to_string(),
        ));
    }
    Ok(StompItem::Heartbeat)
}

/// Parse a `heart-beat` header value: two comma-separated non-negative
/// integers in milliseconds.
pub fn parse_heart_beat(value: &str) -> Result<(u32, u32), ProtocolError> {
    let invalid = || ProtocolError::InvalidHeader {
        header: header::HEART_BEAT,
        value: value.to_string(),
    };
    let (left, right) = value.split_once(',').ok_or_else(invalid)?;
    let cx = left.trim().parse::<u32>().map_err(|_| invalid())?;
    let cy = right.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok((cx, cy))
}

/// Negotiated heart-beat interval for one direction: zero on either side
/// disables it, otherwise the larger of the two wins.
pub fn negotiate_heart_beat(client: u32, server: u32) -> u32 {
    if client == 0 || server == 0 {
        0
    } else {
        client.max(server)
    }
}

/// Interpret a CONNECTED frame against the versions we advertised.
///
/// A missing `version` header means the broker only speaks 1.0; whatever
/// the broker declares must be inside the advertised set or the negotiation
/// fails with `version-mismatch`.
pub fn connected(
    frame: &Frame,
    advertised: &[Version],
) -> Result<ConnectedHeaders, ProtocolError> {
    if frame.command != command::CONNECTED {
        return Err(ProtocolError::InvalidCommandArguments(format!(
            "expected a CONNECTED frame, got {}",
            frame.command
        )));
    }
    let advertised = sorted_versions(advertised);
    let highest = *advertised.last().expect("sorted_versions never empty");

    let version = if highest == Version::V1_0 {
        Version::V1_0
    } else {
        let declared = frame.get_header(header::VERSION).unwrap_or("1.0");
        let mismatch = || ProtocolError::VersionMismatch {
            offered: version_list(&advertised),
            server: declared.to_string(),
        };
        let version = declared.parse::<Version>().map_err(|_| mismatch())?;
        if !advertised.contains(&version) {
            return Err(mismatch());
        }
        version
    };

    let session = frame.get_header(header::SESSION).map(str::to_string);
    let server = if version == Version::V1_0 {
        None
    } else {
        frame.get_header(header::SERVER).map(str::to_string)
    };
    let heart_beat = match frame.get_header(header::HEART_BEAT) {
        Some(value) if version.supports_heart_beat() => parse_heart_beat(value)?,
        _ => (0, 0),
    };

    Ok(ConnectedHeaders {
        version,
        session,
        server,
        heart_beat,
    })
}

/// Interpret a MESSAGE frame, returning the token that matches it to its
/// subscription. `subscription` is mandatory from 1.1 on.
pub fn message(frame: &Frame, version: Version) -> Result<SubscriptionToken, ProtocolError> {
    if frame.command != command::MESSAGE {
        return Err(ProtocolError::InvalidCommandArguments(format!(
            "expected a MESSAGE frame, got {}",
            frame.command
        )));
    }
    require_header(frame, header::MESSAGE_ID)?;
    let destination = require_header(frame, header::DESTINATION)?;
    match frame.get_header(header::SUBSCRIPTION) {
        Some(subscription) => Ok(SubscriptionToken::Id(subscription.to_string())),
        None => {
            if version != Version::V1_0 {
                return Err(ProtocolError::MissingHeader {
                    command: frame.command.clone(),
                    header: header::SUBSCRIPTION,
                });
            }
            Ok(SubscriptionToken::Destination(destination))
        }
    }
}

/// Interpret a RECEIPT frame, returning its receipt id.
pub fn receipt(frame: &Frame) -> Result<String, ProtocolError> {
    if frame.command != command::RECEIPT {
        return Err(ProtocolError::InvalidCommandArguments(format!(
            "expected a RECEIPT frame, got {}",
            frame.command
        )));
    }
    require_header(frame, header::RECEIPT_ID)
}

/// Check that a frame really is an ERROR frame.
pub fn error(frame: &Frame) -> Result<(), ProtocolError> {
    if frame.command != command::ERROR {
        return Err(ProtocolError::InvalidCommandArguments(format!(
            "expected an ERROR frame, got {}",
            frame.command
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_1_0_only_has_no_accept_version() {
        let frame = connect(Some("user"), Some("pass"), &[], &[Version::V1_0], None, None)
            .expect("connect failed");
        assert!(!frame.has_header(header::ACCEPT_VERSION));
        assert!(!frame.has_header(header::HOST));
        assert_eq!(frame.get_header(header::LOGIN), Some("user"));
    }

    #[test]
    fn connect_advertises_sorted_versions() {
        let frame = connect(
            None,
            None,
            &[],
            &[Version::V1_2, Version::V1_0, Version::V1_1],
            Some("/"),
            None,
        )
        .expect("connect failed");
        assert_eq!(frame.get_header(header::ACCEPT_VERSION), Some("1.0,1.1,1.2"));
        assert_eq!(frame.get_header(header::HOST), Some("/"));
    }

    #[test]
    fn connect_1_1_without_host_rejected() {
        let err = connect(None, None, &[], &[Version::V1_1], None, None).unwrap_err();
        assert_eq!(err.kind(), "invalid-command-arguments");
    }

    #[test]
    fn heart_beat_rejected_for_1_0_only() {
        let err =
            connect(None, None, &[], &[Version::V1_0], None, Some((1000, 1000))).unwrap_err();
        assert_eq!(err.kind(), "invalid-command-arguments");
    }

    #[test]
    fn stomp_command_rejected_for_1_0_only() {
        let err = stomp(None, None, &[], &[Version::V1_0], None, None).unwrap_err();
        assert_eq!(err.kind(), "invalid-command-arguments");
        let frame = stomp(None, None, &[], &[], Some("broker"), None).unwrap();
        assert_eq!(frame.command, "STOMP");
    }

    #[test]
    fn send_auto_content_length() {
        let frame = send("/queue/a", b"hi\0there".to_vec(), &[], None, Version::V1_2).unwrap();
        assert_eq!(frame.get_header(header::CONTENT_LENGTH), Some("8"));

        // not in 1.0
        let frame = send("/queue/a", b"hi".to_vec(), &[], None, Version::V1_0).unwrap();
        assert!(!frame.has_header(header::CONTENT_LENGTH));

        // caller-supplied value wins
        let supplied = vec![(header::CONTENT_LENGTH.to_string(), "2".to_string())];
        let frame = send("/queue/a", b"hi".to_vec(), &supplied, None, Version::V1_2).unwrap();
        assert_eq!(frame.get_header(header::CONTENT_LENGTH), Some("2"));

        // empty body adds nothing
        let frame = send("/queue/a", Vec::new(), &[], None, Version::V1_2).unwrap();
        assert!(!frame.has_header(header::CONTENT_LENGTH));
    }

    #[test]
    fn subscribe_requires_id_from_1_1() {
        let err = subscribe("/queue/a", &[], None, Version::V1_1).unwrap_err();
        assert_eq!(err.kind(), "invalid-command-arguments");

        let (_, token) = subscribe("/queue/a", &[], None, Version::V1_0).unwrap();
        assert_eq!(token, SubscriptionToken::Destination("/queue/a".to_string()));

        let headers = vec![(header::ID.to_string(), "s-1".to_string())];
        let (_, token) = subscribe("/queue/a", &headers, None, Version::V1_2).unwrap();
        assert_eq!(token, SubscriptionToken::Id("s-1".to_string()));
    }

    #[test]
    fn unsubscribe_by_destination_is_1_0_only() {
        let token = SubscriptionToken::Destination("/queue/a".to_string());
        assert!(unsubscribe(&token, None, Version::V1_0).is_ok());
        assert!(unsubscribe(&token, None, Version::V1_2).is_err());
    }

    fn sample_message() -> Frame {
        Frame::new(command::MESSAGE)
            .header(header::DESTINATION, "/queue/a")
            .header(header::MESSAGE_ID, "m-7")
            .header(header::SUBSCRIPTION, "s-1")
            .header(header::ACK, "ack-token-3")
    }

    #[test]
    fn ack_headers_per_version() {
        let message = sample_message();

        let frame = ack(&message, None, None, Version::V1_0).unwrap();
        assert_eq!(frame.get_header(header::MESSAGE_ID), Some("m-7"));

        let frame = ack(&message, None, None, Version::V1_1).unwrap();
        assert_eq!(frame.get_header(header::SUBSCRIPTION), Some("s-1"));
        assert_eq!(frame.get_header(header::MESSAGE_ID), Some("m-7"));

        let frame = ack(&message, None, None, Version::V1_2).unwrap();
        assert_eq!(frame.get_header(header::ID), Some("ack-token-3"));
        assert!(!frame.has_header(header::MESSAGE_ID));
    }

    #[test]
    fn ack_1_1_requires_subscription() {
        let message = Frame::new(command::MESSAGE)
            .header(header::DESTINATION, "/queue/a")
            .header(header::MESSAGE_ID, "m-7");
        let err = ack(&message, None, None, Version::V1_1).unwrap_err();
        assert_eq!(err.kind(), "missing-header");
    }

    #[test]
    fn ack_1_2_requires_ack_header() {
        let message = Frame::new(command::MESSAGE)
            .header(header::DESTINATION, "/queue/a")
            .header(header::MESSAGE_ID, "m-7")
            .header(header::SUBSCRIPTION, "s-1");
        let err = ack(&message, None, None, Version::V1_2).unwrap_err();
        assert_eq!(err.kind(), "missing-header");
    }

    #[test]
    fn nack_rejected_in_1_0() {
        let err = nack(&sample_message(), None, None, Version::V1_0).unwrap_err();
        assert_eq!(err.kind(), "invalid-command-arguments");
        assert!(nack(&sample_message(), None, None, Version::V1_1).is_ok());
    }

    #[test]
    fn ack_attaches_transaction() {
        let frame = ack(&sample_message(), Some("tx-1"), None, Version::V1_2).unwrap();
        assert_eq!(frame.get_header(header::TRANSACTION), Some("tx-1"));
    }

    #[test]
    fn transaction_frames_require_id() {
        assert!(begin("", None).is_err());
        let frame = begin("tx-1", Some("r-1")).unwrap();
        assert_eq!(frame.get_header(header::TRANSACTION), Some("tx-1"));
        assert_eq!(frame.get_header(header::RECEIPT), Some("r-1"));
        assert!(commit("tx-1", None).is_ok());
        assert!(abort("tx-1", None).is_ok());
    }

    #[test]
    fn connected_negotiation() {
        let advertised = Version::ALL;
        let frame = Frame::new(command::CONNECTED)
            .header(header::VERSION, "1.2")
            .header(header::SESSION, "s-1")
            .header(header::SERVER, "apollo/1.7")
            .header(header::HEART_BEAT, "2000,3000");
        let headers = connected(&frame, &advertised).unwrap();
        assert_eq!(headers.version, Version::V1_2);
        assert_eq!(headers.session.as_deref(), Some("s-1"));
        assert_eq!(headers.server.as_deref(), Some("apollo/1.7"));
        assert_eq!(headers.heart_beat, (2000, 3000));
    }

    #[test]
    fn connected_without_version_header_is_1_0() {
        let frame = Frame::new(command::CONNECTED).header(header::SESSION, "s-1");
        let headers = connected(&frame, &Version::ALL).unwrap();
        assert_eq!(headers.version, Version::V1_0);
        // 1.0 brokers have no server header semantics
        assert_eq!(headers.server, None);
    }

    #[test]
    fn connected_outside_advertised_set_is_mismatch() {
        let frame = Frame::new(command::CONNECTED).header(header::VERSION, "1.2");
        let err = connected(&frame, &[Version::V1_0, Version::V1_1]).unwrap_err();
        assert_eq!(err.kind(), "version-mismatch");

        // server silent about version while 1.0 was not advertised
        let frame = Frame::new(command::CONNECTED);
        let err = connected(&frame, &[Version::V1_1, Version::V1_2]).unwrap_err();
        assert_eq!(err.kind(), "version-mismatch");
    }

    #[test]
    fn negotiate_heart_beat_zero_disables() {
        assert_eq!(negotiate_heart_beat(0, 5000), 0);
        assert_eq!(negotiate_heart_beat(5000, 0), 0);
        assert_eq!(negotiate_heart_beat(2000, 5000), 5000);
    }

    #[test]
    fn message_token_per_version() {
        let frame = Frame::new(command::MESSAGE)
            .header(header::DESTINATION, "/queue/a")
            .header(header::MESSAGE_ID, "m-1");
        assert_eq!(
            message(&frame, Version::V1_0).unwrap(),
            SubscriptionToken::Destination("/queue/a".to_string())
        );
        assert_eq!(
            message(&frame, Version::V1_1).unwrap_err().kind(),
            "missing-header"
        );

        let frame = frame.header(header::SUBSCRIPTION, "s-1");
        assert_eq!(
            message(&frame, Version::V1_2).unwrap(),
            SubscriptionToken::Id("s-1".to_string())
        );
    }

    #[test]
    fn receipt_requires_receipt_id() {
        let frame = Frame::new(command::RECEIPT).header(header::RECEIPT_ID, "r-9");
        assert_eq!(receipt(&frame).unwrap(), "r-9");
        let err = receipt(&Frame::new(command::RECEIPT)).unwrap_err();
        assert_eq!(err.kind(), "missing-header");
    }
}
