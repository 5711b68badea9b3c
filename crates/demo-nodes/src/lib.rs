//! `demo-nodes` – example nodes for the demo middleware.
//!
//! | Component | What it shows |
//! |---|---|
//! | `add_two_ints_client` | waiting for a service and sending one asynchronous request |
//! | `add_two_ints_server` | answering that request |
//! | `serialized_message_talker` | serializing a message by hand and publishing the raw bytes |
//! | `serialized_message_listener` | receiving raw bytes and deserializing them by hand |
//!
//! Components are looked up by name in a [`ComponentRegistry`] and run side
//! by side in one process by the `demo_nodes` binary.

pub mod config;
pub mod container;
pub mod nodes;
pub mod options;
pub mod telemetry;

pub use config::Config;
pub use container::{Component, ComponentRegistry, run_components};
pub use options::NodeOptions;
