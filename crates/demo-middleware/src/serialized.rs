//! Serialized messages: a reusable byte buffer plus the codec entry points
//! that fill and read it.
//!
//! A [`SerializedMessage`] has an explicit lifecycle that mirrors a C-style
//! middleware buffer: it is initialised with a capacity, resized as needed,
//! and finalised exactly once.  Finalising twice, or using the buffer after
//! finalising it, is reported as [`MwError::AlreadyFinalized`] rather than
//! silently ignored.

use demo_types::codec;
use demo_types::{Message, MwError};

/// Owned wire-format bytes of one message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SerializedMessage {
    buffer: Vec<u8>,
    finalized: bool,
}

impl SerializedMessage {
    /// Allocate an empty buffer able to hold `capacity` bytes.
    ///
    /// A capacity of zero is valid and allocates nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MwError::BadAlloc`] if the allocation fails.
    pub fn with_capacity(capacity: usize) -> Result<Self, MwError> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(capacity).map_err(|e| {
            MwError::BadAlloc(format!("cannot reserve {capacity} bytes: {e}"))
        })?;
        Ok(Self {
            buffer,
            finalized: false,
        })
    }

    /// Wrap bytes received from the wire.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buffer: bytes.to_vec(),
            finalized: false,
        }
    }

    /// Change the capacity to `new_capacity` bytes.
    ///
    /// Shrinking below the current length truncates the content.
    ///
    /// # Errors
    ///
    /// * [`MwError::InvalidArgument`] when `new_capacity` is zero.
    /// * [`MwError::AlreadyFinalized`] after [`fini`][Self::fini].
    /// * [`MwError::BadAlloc`] when growing fails.
    pub fn resize(&mut self, new_capacity: usize) -> Result<(), MwError> {
        self.ensure_live()?;
        if new_capacity == 0 {
            return Err(MwError::InvalidArgument(
                "serialized message capacity must be non-zero".to_string(),
            ));
        }
        if new_capacity < self.buffer.len() {
            self.buffer.truncate(new_capacity);
        }
        if new_capacity > self.buffer.capacity() {
            let additional = new_capacity - self.buffer.len();
            self.buffer.try_reserve_exact(additional).map_err(|e| {
                MwError::BadAlloc(format!("cannot grow to {new_capacity} bytes: {e}"))
            })?;
        } else {
            self.buffer.shrink_to(new_capacity);
        }
        Ok(())
    }

    /// Release the buffer.  Must be called exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`MwError::AlreadyFinalized`] on the second call.
    pub fn fini(&mut self) -> Result<(), MwError> {
        self.ensure_live()?;
        self.buffer = Vec::new();
        self.finalized = true;
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Bytes currently holding encoded data.
    pub fn buffer_length(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes available without reallocating.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// The encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MwError::AlreadyFinalized`] after [`fini`][Self::fini].
    pub fn as_bytes(&self) -> Result<&[u8], MwError> {
        self.ensure_live()?;
        Ok(&self.buffer)
    }

    fn ensure_live(&self) -> Result<(), MwError> {
        if self.finalized {
            Err(MwError::AlreadyFinalized)
        } else {
            Ok(())
        }
    }
}

/// Encode `message` into `out`, replacing its previous content.
///
/// The buffer grows if its capacity is too small; callers that size it up
/// front avoid any allocation here.
pub fn serialize<M: Message>(message: &M, out: &mut SerializedMessage) -> Result<(), MwError> {
    out.ensure_live()?;
    codec::encode_into(message, &mut out.buffer)
}

/// Decode a message of type `M` from `input`.
pub fn deserialize<M: Message>(input: &SerializedMessage) -> Result<M, MwError> {
    codec::decode(input.as_bytes()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use demo_types::msg::STRING_MSG_HEADER_LEN;
    use demo_types::StringMsg;

    #[test]
    fn zero_capacity_init_is_valid() {
        let msg = SerializedMessage::with_capacity(0).unwrap();
        assert_eq!(msg.buffer_length(), 0);
        assert!(!msg.is_finalized());
    }

    #[test]
    fn resize_grows_capacity() {
        let mut msg = SerializedMessage::with_capacity(0).unwrap();
        msg.resize(64).unwrap();
        assert!(msg.buffer_capacity() >= 64);
        assert_eq!(msg.buffer_length(), 0);
    }

    #[test]
    fn resize_to_zero_is_rejected() {
        let mut msg = SerializedMessage::with_capacity(8).unwrap();
        assert!(matches!(msg.resize(0), Err(MwError::InvalidArgument(_))));
    }

    #[test]
    fn shrinking_truncates_content() {
        let mut msg = SerializedMessage::with_capacity(0).unwrap();
        serialize(&StringMsg::new("truncate me"), &mut msg).unwrap();
        msg.resize(4).unwrap();
        assert_eq!(msg.buffer_length(), 4);
    }

    #[test]
    fn fini_twice_is_an_error() {
        let mut msg = SerializedMessage::with_capacity(16).unwrap();
        msg.fini().unwrap();
        assert!(msg.is_finalized());
        assert_eq!(msg.fini(), Err(MwError::AlreadyFinalized));
    }

    #[test]
    fn finalized_buffer_rejects_every_use() {
        let mut msg = SerializedMessage::with_capacity(16).unwrap();
        msg.fini().unwrap();
        assert_eq!(msg.resize(32), Err(MwError::AlreadyFinalized));
        assert_eq!(
            serialize(&StringMsg::new("x"), &mut msg),
            Err(MwError::AlreadyFinalized)
        );
        assert!(msg.as_bytes().is_err());
        assert!(deserialize::<StringMsg>(&msg).is_err());
    }

    #[test]
    fn presized_buffer_is_not_reallocated() {
        let string_msg = StringMsg::new("Hello World:7");
        let mut msg = SerializedMessage::with_capacity(0).unwrap();
        msg.resize(string_msg.serialized_len()).unwrap();
        let capacity = msg.buffer_capacity();

        serialize(&string_msg, &mut msg).unwrap();
        assert_eq!(msg.buffer_capacity(), capacity);
        assert_eq!(
            msg.buffer_length(),
            STRING_MSG_HEADER_LEN + string_msg.payload_len()
        );
    }

    #[test]
    fn undersized_buffer_grows_during_serialize() {
        let mut msg = SerializedMessage::with_capacity(0).unwrap();
        msg.resize(2).unwrap();
        serialize(&StringMsg::new("a longer payload"), &mut msg).unwrap();
        assert_eq!(deserialize::<StringMsg>(&msg).unwrap().data, "a longer payload");
    }

    #[test]
    fn garbage_fails_to_deserialize() {
        let msg = SerializedMessage::from_bytes(&[0x00, 0x01, 0x00, 0x00, 0xff]);
        assert!(matches!(
            deserialize::<StringMsg>(&msg),
            Err(MwError::Deserialization(_))
        ));
    }
}
