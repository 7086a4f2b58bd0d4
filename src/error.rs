use thiserror::Error;

/// Errors raised while parsing bytes off the wire. All of these are fatal to
/// the connection that produced them; the parser stays poisoned until
/// `reset`. The `offset` is the absolute position of the offending byte in
/// the stream fed so far.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("malformed command at byte {offset}: {detail}")]
    MalformedCommand { offset: u64, detail: String },

    #[error("bad header line at byte {offset}: {detail}")]
    BadHeaderLine { offset: u64, detail: String },

    #[error("bad escape sequence at byte {offset}: {detail}")]
    BadEscape { offset: u64, detail: String },

    #[error("body not allowed at byte {offset}: {detail}")]
    BodyOverrun { offset: u64, detail: String },

    #[error("missing NUL terminator after content-length body at byte {offset}")]
    MissingNull { offset: u64 },

    /// Transport-level failure surfaced through the codec seam.
    #[error("io error: {0}")]
    Io(String),
}

impl FramingError {
    /// Stable machine-readable tag; the display strings are advisory only.
    pub fn kind(&self) -> &'static str {
        match self {
            FramingError::MalformedCommand { .. } => "malformed-command",
            FramingError::BadHeaderLine { .. } => "bad-header-line",
            FramingError::BadEscape { .. } => "bad-escape",
            FramingError::BodyOverrun { .. } => "body-overrun",
            FramingError::MissingNull { .. } => "missing-null",
            FramingError::Io(_) => "io",
        }
    }

    /// Byte offset of the offending input, when the error came from parsing.
    pub fn offset(&self) -> Option<u64> {
        match self {
            FramingError::MalformedCommand { offset, .. }
            | FramingError::BadHeaderLine { offset, .. }
            | FramingError::BadEscape { offset, .. }
            | FramingError::BodyOverrun { offset, .. }
            | FramingError::MissingNull { offset } => Some(*offset),
            FramingError::Io(_) => None,
        }
    }
}

// tokio-util requires the codec error to absorb transport errors.
impl From<std::io::Error> for FramingError {
    fn from(err: std::io::Error) -> Self {
        FramingError::Io(err.to_string())
    }
}

/// Errors raised by the stateless command constructors and the session state
/// machine. None of these involve the wire: when one is returned, nothing
/// has been transmitted and (unless documented otherwise) no state changed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid command arguments: {0}")]
    InvalidCommandArguments(String),

    #[error("cannot issue {command} in state {state}")]
    IllegalInState {
        command: String,
        state: &'static str,
    },

    #[error("cannot handle {command} frame in state {state}")]
    UnexpectedFrame {
        command: String,
        state: &'static str,
    },

    #[error("{command} frame requires a {header} header")]
    MissingHeader {
        command: String,
        header: &'static str,
    },

    #[error("invalid {header} header: {value}")]
    InvalidHeader { header: &'static str, value: String },

    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("transaction already active: {0}")]
    DuplicateTransaction(String),

    #[error("unexpected receipt: {0}")]
    UnmatchedReceipt(String),

    #[error("receipt already pending: {0}")]
    DuplicateReceipt(String),

    #[error("no such subscription: {0}")]
    UnknownSubscription(String),

    #[error("already subscribed: {0}")]
    DuplicateSubscription(String),

    #[error("server version {server} not within accepted versions {offered}")]
    VersionMismatch { offered: String, server: String },

    #[error("version not supported: {0}")]
    UnsupportedVersion(String),
}

impl ProtocolError {
    /// Stable machine-readable tag; the display strings are advisory only.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::InvalidCommandArguments(_) => "invalid-command-arguments",
            ProtocolError::IllegalInState { .. } => "illegal-in-state",
            ProtocolError::UnexpectedFrame { .. } => "unexpected-frame",
            ProtocolError::MissingHeader { .. } => "missing-header",
            ProtocolError::InvalidHeader { .. } => "invalid-header",
            ProtocolError::UnknownTransaction(_) => "unknown-transaction",
            ProtocolError::DuplicateTransaction(_) => "duplicate-transaction",
            ProtocolError::UnmatchedReceipt(_) => "unmatched-receipt",
            ProtocolError::DuplicateReceipt(_) => "duplicate-receipt",
            ProtocolError::UnknownSubscription(_) => "unknown-subscription",
            ProtocolError::DuplicateSubscription(_) => "duplicate-subscription",
            ProtocolError::VersionMismatch { .. } => "version-mismatch",
            ProtocolError::UnsupportedVersion(_) => "unsupported-version",
        }
    }
}

/// Errors raised while parsing a failover URI. Exhaustion of the broker list
/// is not an error; the transport signals it by returning `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FailoverError {
    #[error("malformed failover uri: {0}")]
    MalformedUri(String),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("bad value for option {option}: {value}")]
    BadOptionValue { option: String, value: String },
}

impl FailoverError {
    /// Stable machine-readable tag; the display strings are advisory only.
    pub fn kind(&self) -> &'static str {
        match self {
            FailoverError::MalformedUri(_) => "malformed-uri",
            FailoverError::UnknownOption(_) => "unknown-option",
            FailoverError::BadOptionValue { .. } => "bad-option-value",
        }
    }
}
