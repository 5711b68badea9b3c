//! `demo-middleware` – in-process stand-in for the robotics middleware the
//! demo nodes are written against.
//!
//! Everything lives in one process: endpoints find each other through the
//! [`Graph`] owned by a [`Context`], topic traffic rides Tokio broadcast
//! channels, and service calls are dispatched straight to the registered
//! server.  Payloads still cross every boundary as CDR bytes so the nodes see
//! the same serialized representation a networked middleware would hand them.
//!
//! # Modules
//!
//! - [`context`] – process-wide shutdown flag and graph owner.
//! - [`graph`] – name registry for topics and services.
//! - [`names`] – topic/service name validation and expansion.
//! - [`node`] – the factory every publisher, subscription, client, service
//!   and timer is created from.
//! - [`serialized`] – the reusable serialized-message buffer and the
//!   `serialize` / `deserialize` codec entry points.

pub mod client;
pub mod context;
pub mod graph;
pub mod names;
pub mod node;
pub mod publisher;
pub mod qos;
pub mod serialized;
pub mod service;
pub mod subscription;
pub mod timer;

pub use client::{Client, PendingRequest};
pub use context::Context;
pub use graph::Graph;
pub use node::Node;
pub use publisher::Publisher;
pub use qos::QoS;
pub use serialized::{SerializedMessage, deserialize, serialize};
pub use service::Service;
pub use subscription::Subscription;
pub use timer::WallTimer;
