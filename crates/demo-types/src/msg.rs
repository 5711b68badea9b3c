//! Topic message types.

use serde::{Deserialize, Serialize};

use crate::Message;
use crate::codec::ENCAPSULATION_HEADER_LEN;

/// Bytes every encoded [`StringMsg`] spends before its payload: the
/// encapsulation header plus the `u32` string length prefix.
pub const STRING_MSG_HEADER_LEN: usize = ENCAPSULATION_HEADER_LEN + 4;

/// `std_msgs/msg/String`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMsg {
    pub data: String,
}

impl StringMsg {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Encoded size of the string body: its bytes plus the NUL terminator.
    pub fn payload_len(&self) -> usize {
        self.data.len() + 1
    }

    /// Exact size of this message once encoded.
    pub fn serialized_len(&self) -> usize {
        STRING_MSG_HEADER_LEN + self.payload_len()
    }
}

impl Message for StringMsg {
    const TYPE_NAME: &'static str = "std_msgs/msg/String";
}
