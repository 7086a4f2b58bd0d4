//! Sans-io client core for the STOMP wire protocol (versions 1.0, 1.1
//! and 1.2).
//!
//! The crate has four parts, none of which perform I/O:
//!
//! - [`codec`] / [`parser`]: an incremental frame parser and a
//!   version-aware serializer, also packaged as a
//!   `tokio_util::codec::{Decoder, Encoder}` pair for use with `Framed`
//!   transports.
//! - [`commands`]: stateless constructors for every client frame, with
//!   per-version header rules enforced before anything hits the wire.
//! - [`session`]: a state machine tracking connect negotiation,
//!   subscriptions, transactions and receipts, including the replay
//!   information needed to resume after a broker failover.
//! - [`failover`]: the `failover:` URI scheme and the reconnect/backoff
//!   schedule it describes.
//!
//! A host owns the transport and the scheduling: it feeds inbound bytes to
//! the codec, hands completed frames to the session, writes the session's
//! outbound frames in order, and drives heart-beat timers from the
//! negotiated intervals. After negotiation, remember to align the codec
//! with `codec.set_version(session.negotiated_version().unwrap())` so
//! header escaping follows the agreed version.

pub mod codec;
pub mod commands;
pub mod error;
pub mod escape;
pub mod failover;
pub mod frame;
pub mod parser;
pub mod session;
pub mod spec;

pub use codec::{StompCodec, StompItem};
pub use commands::{ConnectedHeaders, SubscriptionToken};
pub use error::{FailoverError, FramingError, ProtocolError};
pub use failover::{Broker, FailoverTransport, FailoverUri};
pub use frame::Frame;
pub use parser::StompParser;
pub use session::{ConnectOptions, SessionEvent, SessionState, StompSession};
pub use spec::{AckMode, Version};
