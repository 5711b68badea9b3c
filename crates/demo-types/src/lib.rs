//! `demo-types` – shared vocabulary of the demo nodes workspace.
//!
//! Holds the message and service types exchanged by the demo nodes, the CDR
//! codec used to put them on the wire, the per-frame metadata attached by
//! the middleware, and the single error type every crate returns.

pub mod codec;
pub mod msg;
pub mod srv;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use msg::StringMsg;
pub use srv::{AddTwoInts, AddTwoIntsRequest, AddTwoIntsResponse};

/// A type that can travel over a topic or as one half of a service call.
///
/// The serde derive describes the CDR layout: fields are encoded in
/// declaration order by [`codec`].
pub trait Message: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Fully qualified interface name, e.g. `std_msgs/msg/String`.
    const TYPE_NAME: &'static str;
}

/// A request/response pair addressed by a single service name.
pub trait ServiceType: Send + Sync + 'static {
    type Request: Message;
    type Response: Message;

    /// Fully qualified interface name, e.g. `example_interfaces/srv/AddTwoInts`.
    const TYPE_NAME: &'static str;
}

/// Metadata the middleware attaches to every published frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Identity of the publisher that sent the frame.
    pub publisher_gid: Uuid,
    /// Per-publisher sequence number, starting at 1.
    pub sequence_number: u64,
    pub source_timestamp: DateTime<Utc>,
}

/// Identifies one request sent by one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestHeader {
    pub client_gid: Uuid,
    /// Per-client sequence number, starting at 1.
    pub sequence_number: i64,
}

/// Error type shared by the middleware and the demo nodes.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MwError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("allocation failed: {0}")]
    BadAlloc(String),

    #[error("serialized message has already been finalized")]
    AlreadyFinalized,

    #[error("failed to serialize message: {0}")]
    Serialization(String),

    #[error("failed to deserialize message: {0}")]
    Deserialization(String),

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("'{name}' is registered with type {existing}, not {requested}")]
    TypeMismatch {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("a server for service '{0}' already exists")]
    ServiceAlreadyExists(String),

    #[error("service '{0}' is not available")]
    ServiceUnavailable(String),

    #[error("context was shut down")]
    ShutdownRequested,

    #[error("channel error: {0}")]
    Channel(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no component named '{0}' is registered")]
    UnknownComponent(String),
}
