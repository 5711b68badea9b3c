//! CDR wire encoding for [`Message`] types.
//!
//! Every encoded buffer starts with a 4-byte encapsulation header,
//! `00 01 00 00` for little endian.  Encoding always produces little endian;
//! decoding accepts either byte order.

use cdr::{CdrLe, Infinite};

use crate::{Message, MwError};

/// Length of the encapsulation header that prefixes every CDR buffer.
pub const ENCAPSULATION_HEADER_LEN: usize = 4;

/// Encode `message` into a new buffer.
pub fn encode<M: Message>(message: &M) -> Result<Vec<u8>, MwError> {
    cdr::serialize::<_, _, CdrLe>(message, Infinite)
        .map_err(|e| MwError::Serialization(e.to_string()))
}

/// Encode `message` into `buffer`, replacing its content.
///
/// The existing allocation is reused, so a buffer sized up front does not
/// reallocate.
pub fn encode_into<M: Message>(message: &M, buffer: &mut Vec<u8>) -> Result<(), MwError> {
    buffer.clear();
    cdr::serialize_into::<_, _, _, CdrLe>(&mut *buffer, message, Infinite)
        .map_err(|e| MwError::Serialization(e.to_string()))
}

/// Decode a message of type `M` from a complete encoded buffer.
pub fn decode<M: Message>(bytes: &[u8]) -> Result<M, MwError> {
    let message: M =
        cdr::deserialize(bytes).map_err(|e| MwError::Deserialization(e.to_string()))?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AddTwoIntsRequest, AddTwoIntsResponse, StringMsg};

    #[test]
    fn string_layout_matches_wire_format() {
        let buf = encode(&StringMsg::new("Hello World:1")).unwrap();
        assert_eq!(&buf[..4], &[0x00, 0x01, 0x00, 0x00]);
        // Length prefix counts the terminator.
        assert_eq!(&buf[4..8], &14u32.to_le_bytes());
        assert_eq!(&buf[8..21], b"Hello World:1");
        assert_eq!(buf[21], 0);
        assert_eq!(buf.len(), 22);
    }

    #[test]
    fn encode_into_reuses_the_allocation() {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(b"stale content");
        let capacity = buf.capacity();
        encode_into(&AddTwoIntsRequest { a: 2, b: 3 }, &mut buf).unwrap();
        assert_eq!(buf.capacity(), capacity);
        assert_eq!(buf, encode(&AddTwoIntsRequest { a: 2, b: 3 }).unwrap());
    }

    #[test]
    fn big_endian_input_is_accepted() {
        let buf = cdr::serialize::<_, _, cdr::CdrBe>(&AddTwoIntsResponse { sum: 5 }, Infinite)
            .unwrap();
        assert_eq!(&buf[..4], &[0x00, 0x00, 0x00, 0x00]);
        let response: AddTwoIntsResponse = decode(&buf).unwrap();
        assert_eq!(response.sum, 5);
    }

    #[test]
    fn short_and_headerless_input_is_rejected() {
        assert!(matches!(
            decode::<StringMsg>(&[0x00, 0x01]),
            Err(MwError::Deserialization(_))
        ));
        assert!(matches!(
            decode::<AddTwoIntsResponse>(&[0x00, 0x01, 0x00, 0x00, 0x05, 0x00]),
            Err(MwError::Deserialization(_))
        ));
        assert!(matches!(
            decode::<StringMsg>(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x00, 0x00, 0x00]),
            Err(MwError::Deserialization(_))
        ));
    }
}
