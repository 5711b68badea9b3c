//! The demo nodes.

pub mod add_two_ints_client;
pub mod add_two_ints_server;
pub mod listener_serialized_message;
pub mod talker_serialized_message;

/// Render bytes the way a packet trace shows them: two lowercase hex digits
/// per byte, each followed by a space.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x} ")).collect()
}
