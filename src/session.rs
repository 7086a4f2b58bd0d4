//! Client-side STOMP session state machine.
//!
//! [`StompSession`] is transport-agnostic: it produces the frames a client
//! must send and validates the frames a broker sent back, but never touches
//! a socket. A host feeds inbound frames through [`StompSession::on_frame`]
//! and writes the frames returned from the outbound methods to its
//! transport, preserving order. Operations are plain synchronous state
//! transitions; a multi-threaded host wraps the session in its own lock.
//!
//! The session tracks everything needed to survive a broker failover:
//! active subscriptions (with their caller contexts, for
//! [`StompSession::replay`]), active transactions, and outstanding
//! receipts.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::codec::StompItem;
use crate::commands::{self, SubscriptionToken};
use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::spec::{command, header, AckMode, Version};

/// Connection-level session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection. `abrupt` distinguishes a broken connection (with
    /// subscription state retained for replay) from a clean shutdown.
    Disconnected { abrupt: bool },
    /// CONNECT sent, CONNECTED not yet received.
    Connecting,
    Connected,
    /// DISCONNECT sent; only receipts may still arrive.
    Disconnecting,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Disconnected { .. } => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Disconnecting => "disconnecting",
        }
    }
}

/// Options for [`StompSession::connect`].
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub login: Option<String>,
    pub passcode: Option<String>,
    /// Virtual host; mandatory whenever 1.1+ is advertised.
    pub host: Option<String>,
    /// Client `(cx, cy)` heart-beat offer in milliseconds.
    pub heart_beat: Option<(u32, u32)>,
    /// Additional CONNECT headers, passed through verbatim.
    pub headers: Vec<(String, String)>,
    /// Versions to advertise; `None` advertises everything up to the
    /// session's version ceiling.
    pub versions: Option<Vec<Version>>,
}

/// What [`StompSession::on_frame`] distilled out of a broker frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connected {
        version: Version,
        session_id: Option<String>,
        server: Option<String>,
        /// Negotiated `(outgoing, incoming)` heart-beat intervals in ms;
        /// zero disables a direction.
        heart_beat: (u32, u32),
    },
    Message {
        token: SubscriptionToken,
        frame: Frame,
    },
    Receipt {
        id: String,
    },
    /// The broker reported an error. The session is already disconnected
    /// (abrupt) when the host sees this; any receipts still outstanding are
    /// reported here as lost.
    BrokerError {
        frame: Frame,
        lost_receipts: Vec<String>,
    },
}

/// A live subscription as the session remembers it.
#[derive(Debug)]
pub struct Subscription<C> {
    seq: u64,
    destination: String,
    ack: AckMode,
    headers: Vec<(String, String)>,
    context: C,
}

impl<C> Subscription<C> {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn ack_mode(&self) -> AckMode {
        self.ack
    }

    /// The headers the subscription was issued with, including the `id`
    /// header whether caller-chosen or session-assigned.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn context(&self) -> &C {
        &self.context
    }
}

/// An outbound frame tagged with a `receipt` header that the broker has not
/// answered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReceipt {
    pub id: String,
    /// Command of the frame that requested the receipt.
    pub command: String,
}

/// An abstract STOMP session; see the module docs.
///
/// `C` is a caller-chosen context stored per subscription (a handler key, a
/// channel sender, ...) and handed back alongside [`StompSession::replay`]
/// so message routing can be re-established after a failover.
#[derive(Debug)]
pub struct StompSession<C = ()> {
    ceiling: Version,
    negotiated: Option<Version>,
    advertised: Vec<Version>,
    state: SessionState,
    session_id: Option<String>,
    server: Option<String>,
    client_heart_beat: (u32, u32),
    server_heart_beat: (u32, u32),
    subscriptions: HashMap<SubscriptionToken, Subscription<C>>,
    transactions: HashSet<String>,
    receipts: Vec<PendingReceipt>,
    next_subscription_id: u64,
    next_transaction_id: u64,
    next_receipt: u64,
}

impl<C> StompSession<C> {
    /// Create a session that will advertise every version up to `version`.
    pub fn new(version: Version) -> Self {
        Self {
            ceiling: version,
            negotiated: None,
            advertised: Vec::new(),
            state: SessionState::Disconnected { abrupt: false },
            session_id: None,
            server: None,
            client_heart_beat: (0, 0),
            server_heart_beat: (0, 0),
            subscriptions: HashMap::new(),
            transactions: HashSet::new(),
            receipts: Vec::new(),
            next_subscription_id: 1,
            next_transaction_id: 1,
            next_receipt: 1,
        }
    }

    // -- outbound ----------------------------------------------------------

    /// Build the CONNECT frame and move to `connecting`. Legal only while
    /// disconnected; subscriptions retained from a broken connection stay
    /// in place so they can be replayed once the new connection is up.
    pub fn connect(&mut self, options: &ConnectOptions) -> Result<Frame, ProtocolError> {
        self.check_issue(
            command::CONNECT,
            matches!(self.state, SessionState::Disconnected { .. }),
        )?;
        let advertised = match &options.versions {
            None => Version::ALL
                .iter()
                .copied()
                .filter(|v| *v <= self.ceiling)
                .collect::<Vec<_>>(),
            Some(versions) => {
                if let Some(bad) = versions.iter().find(|v| **v > self.ceiling) {
                    return Err(ProtocolError::UnsupportedVersion(bad.to_string()));
                }
                versions.clone()
            }
        };
        let frame = commands::connect(
            options.login.as_deref(),
            options.passcode.as_deref(),
            &options.headers,
            &advertised,
            options.host.as_deref(),
            options.heart_beat,
        )?;
        self.advertised = advertised;
        self.client_heart_beat = options.heart_beat.unwrap_or((0, 0));
        self.state = SessionState::Connecting;
        tracing::debug!(state = self.state.name(), "CONNECT issued");
        Ok(frame)
    }

    /// Build a SEND frame. A `transaction` header must name an active
    /// transaction; on a stale token the error leaves all state untouched.
    pub fn send(
        &mut self,
        destination: &str,
        body: Vec<u8>,
        extra_headers: &[(String, String)],
        receipt: Option<&str>,
    ) -> Result<Frame, ProtocolError> {
        self.check_issue(command::SEND, self.state == SessionState::Connected)?;
        self.check_transaction_header(extra_headers)?;
        let frame = commands::send(destination, body, extra_headers, receipt, self.version())?;
        self.register_receipt(receipt, command::SEND)?;
        Ok(frame)
    }

    /// Build a SUBSCRIBE frame and start tracking the subscription. When no
    /// `id` header is supplied and the version requires one, a
    /// session-assigned id is added. The returned token matches future
    /// MESSAGE frames to `context`.
    pub fn subscribe(
        &mut self,
        destination: &str,
        extra_headers: &[(String, String)],
        receipt: Option<&str>,
        context: C,
    ) -> Result<(SubscriptionToken, Frame), ProtocolError> {
        self.check_issue(command::SUBSCRIBE, self.state == SessionState::Connected)?;
        let version = self.version();

        let mut headers = extra_headers.to_vec();
        if version != Version::V1_0 && !headers.iter().any(|(name, _)| name == header::ID) {
            headers.push((header::ID.to_string(), self.next_subscription_id.to_string()));
        }
        let ack = match headers
            .iter()
            .find(|(name, _)| name == header::ACK)
            .map(|(_, value)| value.as_str())
        {
            None => AckMode::Auto,
            Some(value) => AckMode::from_header(value).ok_or(ProtocolError::InvalidHeader {
                header: header::ACK,
                value: value.to_string(),
            })?,
        };

        let (frame, token) = commands::subscribe(destination, &headers, receipt, version)?;
        if self.subscriptions.contains_key(&token) {
            return Err(ProtocolError::DuplicateSubscription(token.to_string()));
        }
        self.register_receipt(receipt, command::SUBSCRIBE)?;

        let seq = self.next_subscription_id;
        self.next_subscription_id += 1;
        self.subscriptions.insert(
            token.clone(),
            Subscription {
                seq,
                destination: destination.to_string(),
                ack,
                headers,
                context,
            },
        );
        tracing::debug!(token = %token, destination, "subscribed");
        Ok((token, frame))
    }

    /// Build an UNSUBSCRIBE frame and drop the subscription immediately
    /// (the broker is trusted to honor it).
    pub fn unsubscribe(
        &mut self,
        token: &SubscriptionToken,
        receipt: Option<&str>,
    ) -> Result<Frame, ProtocolError> {
        self.check_issue(command::UNSUBSCRIBE, self.state == SessionState::Connected)?;
        if !self.subscriptions.contains_key(token) {
            return Err(ProtocolError::UnknownSubscription(token.to_string()));
        }
        let frame = commands::unsubscribe(token, receipt, self.version())?;
        self.register_receipt(receipt, command::UNSUBSCRIBE)?;
        self.subscriptions.remove(token);
        tracing::debug!(token = %token, "unsubscribed");
        Ok(frame)
    }

    /// Build a BEGIN frame and mark the transaction active. With `None` a
    /// session-assigned transaction id is used; the id actually begun is
    /// returned alongside the frame.
    pub fn begin(
        &mut self,
        transaction: Option<&str>,
        receipt: Option<&str>,
    ) -> Result<(String, Frame), ProtocolError> {
        self.check_issue(command::BEGIN, self.state == SessionState::Connected)?;
        let transaction = match transaction {
            Some(id) => id.to_string(),
            None => {
                let id = format!("tx-{}", self.next_transaction_id);
                self.next_transaction_id += 1;
                id
            }
        };
        if self.transactions.contains(&transaction) {
            return Err(ProtocolError::DuplicateTransaction(transaction));
        }
        let frame = commands::begin(&transaction, receipt)?;
        self.register_receipt(receipt, command::BEGIN)?;
        self.transactions.insert(transaction.clone());
        Ok((transaction, frame))
    }

    /// Build a COMMIT frame and forget the transaction.
    pub fn commit(
        &mut self,
        transaction: &str,
        receipt: Option<&str>,
    ) -> Result<Frame, ProtocolError> {
        self.finish_transaction(command::COMMIT, transaction, receipt)
    }

    /// Build an ABORT frame and forget the transaction.
    pub fn abort(
        &mut self,
        transaction: &str,
        receipt: Option<&str>,
    ) -> Result<Frame, ProtocolError> {
        self.finish_transaction(command::ABORT, transaction, receipt)
    }

    fn finish_transaction(
        &mut self,
        cmd: &'static str,
        transaction: &str,
        receipt: Option<&str>,
    ) -> Result<Frame, ProtocolError> {
        self.check_issue(cmd, self.state == SessionState::Connected)?;
        if !self.transactions.contains(transaction) {
            return Err(ProtocolError::UnknownTransaction(transaction.to_string()));
        }
        let frame = match cmd {
            command::COMMIT => commands::commit(transaction, receipt)?,
            _ => commands::abort(transaction, receipt)?,
        };
        self.register_receipt(receipt, cmd)?;
        self.transactions.remove(transaction);
        Ok(frame)
    }

    /// Build an ACK frame for a received MESSAGE frame.
    pub fn ack(
        &mut self,
        message: &Frame,
        transaction: Option<&str>,
        receipt: Option<&str>,
    ) -> Result<Frame, ProtocolError> {
        self.check_issue(command::ACK, self.state == SessionState::Connected)?;
        self.check_transaction(transaction)?;
        let frame = commands::ack(message, transaction, receipt, self.version())?;
        self.register_receipt(receipt, command::ACK)?;
        Ok(frame)
    }

    /// Build a NACK frame for a received MESSAGE frame. Not available
    /// in 1.0.
    pub fn nack(
        &mut self,
        message: &Frame,
        transaction: Option<&str>,
        receipt: Option<&str>,
    ) -> Result<Frame, ProtocolError> {
        self.check_issue(command::NACK, self.state == SessionState::Connected)?;
        self.check_transaction(transaction)?;
        let frame = commands::nack(message, transaction, receipt, self.version())?;
        self.register_receipt(receipt, command::NACK)?;
        Ok(frame)
    }

    /// Build the DISCONNECT frame and move to `disconnecting`. For a
    /// graceful shutdown pass a receipt, wait for the matching
    /// [`SessionEvent::Receipt`], then close the transport and call
    /// [`StompSession::close`].
    pub fn disconnect(&mut self, receipt: Option<&str>) -> Result<Frame, ProtocolError> {
        self.check_issue(command::DISCONNECT, self.state == SessionState::Connected)?;
        let frame = commands::disconnect(receipt)?;
        self.register_receipt(receipt, command::DISCONNECT)?;
        self.state = SessionState::Disconnecting;
        tracing::debug!(state = self.state.name(), "DISCONNECT issued");
        Ok(frame)
    }

    /// An outbound heart-beat item. Not available in 1.0.
    pub fn beat(&self) -> Result<StompItem, ProtocolError> {
        commands::beat(self.version())
    }

    // -- inbound -----------------------------------------------------------

    /// Validate a broker frame against the current state and fold it into
    /// the session.
    pub fn on_frame(&mut self, frame: Frame) -> Result<SessionEvent, ProtocolError> {
        match frame.command.as_str() {
            command::CONNECTED => self.on_connected(frame),
            command::MESSAGE => self.on_message(frame),
            command::RECEIPT => self.on_receipt(frame),
            command::ERROR => self.on_error(frame),
            other => Err(ProtocolError::UnexpectedFrame {
                command: other.to_string(),
                state: self.state.name(),
            }),
        }
    }

    fn on_connected(&mut self, frame: Frame) -> Result<SessionEvent, ProtocolError> {
        self.check_handle(&frame, self.state == SessionState::Connecting)?;
        match commands::connected(&frame, &self.advertised) {
            Ok(headers) => {
                self.negotiated = Some(headers.version);
                self.session_id = headers.session;
                self.server = headers.server;
                self.server_heart_beat = headers.heart_beat;
                self.state = SessionState::Connected;
                let heart_beat = self.negotiated_heart_beat();
                tracing::debug!(
                    version = %headers.version,
                    session = self.session_id.as_deref().unwrap_or(""),
                    "connected"
                );
                Ok(SessionEvent::Connected {
                    version: headers.version,
                    session_id: self.session_id.clone(),
                    server: self.server.clone(),
                    heart_beat,
                })
            }
            Err(err) => {
                // failed negotiation kills the connection
                tracing::warn!(error = %err, "connection negotiation failed");
                self.abort_connection();
                Err(err)
            }
        }
    }

    fn on_message(&mut self, frame: Frame) -> Result<SessionEvent, ProtocolError> {
        self.check_handle(&frame, self.state == SessionState::Connected)?;
        let token = commands::message(&frame, self.version())?;
        let subscription = self
            .subscriptions
            .get(&token)
            .ok_or_else(|| ProtocolError::UnknownSubscription(token.to_string()))?;
        if self.version() == Version::V1_2
            && subscription.ack != AckMode::Auto
            && !frame.has_header(header::ACK)
        {
            return Err(ProtocolError::MissingHeader {
                command: frame.command.clone(),
                header: header::ACK,
            });
        }
        Ok(SessionEvent::Message { token, frame })
    }

    fn on_receipt(&mut self, frame: Frame) -> Result<SessionEvent, ProtocolError> {
        self.check_handle(
            &frame,
            matches!(
                self.state,
                SessionState::Connected | SessionState::Disconnecting
            ),
        )?;
        let id = commands::receipt(&frame)?;
        let position = self
            .receipts
            .iter()
            .position(|pending| pending.id == id)
            .ok_or_else(|| ProtocolError::UnmatchedReceipt(id.clone()))?;
        self.receipts.remove(position);
        Ok(SessionEvent::Receipt { id })
    }

    fn on_error(&mut self, frame: Frame) -> Result<SessionEvent, ProtocolError> {
        self.check_handle(
            &frame,
            !matches!(self.state, SessionState::Disconnected { .. }),
        )?;
        commands::error(&frame)?;
        tracing::warn!(
            detail = frame.get_header("message").unwrap_or(""),
            "broker reported an error"
        );
        let lost_receipts = self.abort_connection();
        Ok(SessionEvent::BrokerError {
            frame,
            lost_receipts,
        })
    }

    // -- lifecycle ---------------------------------------------------------

    /// Tell the session its transport died. Subscriptions and transactions
    /// are retained so the host can replay after reconnecting; outstanding
    /// receipts can no longer be answered and are returned as lost.
    pub fn connection_lost(&mut self) -> Vec<String> {
        self.abort_connection()
    }

    /// Wipe the session after a clean shutdown: no replay state survives.
    pub fn close(&mut self) {
        self.negotiated = None;
        self.advertised.clear();
        self.session_id = None;
        self.server = None;
        self.client_heart_beat = (0, 0);
        self.server_heart_beat = (0, 0);
        self.subscriptions.clear();
        self.transactions.clear();
        self.receipts.clear();
        self.state = SessionState::Disconnected { abrupt: false };
        tracing::debug!("session closed");
    }

    fn abort_connection(&mut self) -> Vec<String> {
        let lost: Vec<String> = self.receipts.drain(..).map(|pending| pending.id).collect();
        if !lost.is_empty() {
            tracing::warn!(count = lost.len(), "pending receipts lost");
        }
        self.session_id = None;
        self.server = None;
        self.server_heart_beat = (0, 0);
        self.state = SessionState::Disconnected { abrupt: true };
        lost
    }

    /// The SUBSCRIBE frames to re-issue on a fresh connection, oldest
    /// subscription first, each with the headers it was originally issued
    /// with. The subscription set itself is left in place; use
    /// [`StompSession::context`] to re-attach handlers per token.
    pub fn replay(&self) -> Result<Vec<(SubscriptionToken, Frame)>, ProtocolError> {
        let mut subscriptions: Vec<(&SubscriptionToken, &Subscription<C>)> =
            self.subscriptions.iter().collect();
        subscriptions.sort_by_key(|(_, subscription)| subscription.seq);
        subscriptions
            .into_iter()
            .map(|(token, subscription)| {
                let (frame, _) = commands::subscribe(
                    &subscription.destination,
                    &subscription.headers,
                    None,
                    self.version(),
                )?;
                Ok((token.clone(), frame))
            })
            .collect()
    }

    // -- introspection -----------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The version settled by negotiation, or `None` before the first
    /// CONNECTED frame.
    pub fn negotiated_version(&self) -> Option<Version> {
        self.negotiated
    }

    /// Broker-assigned session id, when connected.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Broker software banner from the CONNECTED frame, when provided.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn subscription(&self, token: &SubscriptionToken) -> Option<&Subscription<C>> {
        self.subscriptions.get(token)
    }

    /// Caller context attached at subscribe time.
    pub fn context(&self, token: &SubscriptionToken) -> Option<&C> {
        self.subscriptions.get(token).map(|s| &s.context)
    }

    pub fn pending_receipts(&self) -> &[PendingReceipt] {
        &self.receipts
    }

    pub fn has_pending_receipts(&self) -> bool {
        !self.receipts.is_empty()
    }

    pub fn is_receipt_pending(&self, id: &str) -> bool {
        self.receipts.iter().any(|pending| pending.id == id)
    }

    /// Mint a receipt id unique within this session.
    pub fn next_receipt_id(&mut self) -> String {
        let id = format!("r-{}", self.next_receipt);
        self.next_receipt += 1;
        id
    }

    /// Negotiated `(outgoing, incoming)` heart-beat intervals in ms; zero
    /// disables a direction.
    pub fn negotiated_heart_beat(&self) -> (u32, u32) {
        let (cx, cy) = self.client_heart_beat;
        let (sx, sy) = self.server_heart_beat;
        (
            commands::negotiate_heart_beat(cx, sy),
            commands::negotiate_heart_beat(cy, sx),
        )
    }

    /// Negotiated intervals as durations, `None` for a disabled direction —
    /// convenient for driving timers.
    pub fn heart_beat_intervals(&self) -> (Option<Duration>, Option<Duration>) {
        let (outgoing, incoming) = self.negotiated_heart_beat();
        let to_duration = |ms: u32| {
            if ms == 0 {
                None
            } else {
                Some(Duration::from_millis(u64::from(ms)))
            }
        };
        (to_duration(outgoing), to_duration(incoming))
    }

    // -- helpers -----------------------------------------------------------

    fn version(&self) -> Version {
        self.negotiated.unwrap_or(self.ceiling)
    }

    fn check_issue(&self, cmd: &str, legal: bool) -> Result<(), ProtocolError> {
        if legal {
            Ok(())
        } else {
            Err(ProtocolError::IllegalInState {
                command: cmd.to_string(),
                state: self.state.name(),
            })
        }
    }

    fn check_handle(&self, frame: &Frame, legal: bool) -> Result<(), ProtocolError> {
        if legal {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedFrame {
                command: frame.command.clone(),
                state: self.state.name(),
            })
        }
    }

    fn check_transaction(&self, transaction: Option<&str>) -> Result<(), ProtocolError> {
        match transaction {
            Some(id) if !self.transactions.contains(id) => {
                Err(ProtocolError::UnknownTransaction(id.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_transaction_header(&self, headers: &[(String, String)]) -> Result<(), ProtocolError> {
        match headers
            .iter()
            .find(|(name, _)| name == header::TRANSACTION)
        {
            Some((_, id)) => self.check_transaction(Some(id.as_str())),
            None => Ok(()),
        }
    }

    fn register_receipt(
        &mut self,
        receipt: Option<&str>,
        cmd: &str,
    ) -> Result<(), ProtocolError> {
        let Some(id) = receipt else {
            return Ok(());
        };
        if self.receipts.iter().any(|pending| pending.id == id) {
            return Err(ProtocolError::DuplicateReceipt(id.to_string()));
        }
        self.receipts.push(PendingReceipt {
            id: id.to_string(),
            command: cmd.to_string(),
        });
        Ok(())
    }
}

impl<C> Default for StompSession<C> {
    fn default() -> Self {
        Self::new(Version::V1_2)
    }
}
