//! Length-prefixed UTF-8 strings, as used throughout the MQTT wire format
//! (MQTT 5.0 §1.5.4).

use crate::error::DecodeError;

/// Writes a length-prefixed UTF-8 string. An empty string encodes as the
/// two zero bytes `[0x00, 0x00]` (see SPEC_FULL.md's note on the empty
/// client-id encoding).
pub fn encode_str(buf: &mut Vec<u8>, s: &str) {
    let len = s.len() as u16;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
}

pub fn encoded_str_len(s: &str) -> usize {
    2 + s.len()
}

/// Decodes a length-prefixed UTF-8 string from the front of `bytes`.
/// Returns the string and the number of bytes consumed.
pub fn decode_str(bytes: &[u8]) -> Result<(String, usize), DecodeError> {
    if bytes.len() < 2 {
        return Err(DecodeError::UnexpectedEof);
    }
    let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    if bytes.len() < 2 + len {
        return Err(DecodeError::UnexpectedEof);
    }
    let s = std::str::from_utf8(&bytes[2..2 + len]).map_err(|_| DecodeError::InvalidUtf8)?;
    Ok((s.to_string(), 2 + len))
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn empty_string_is_two_zero_bytes() {
        let mut buf = Vec::new();
        encode_str(&mut buf, "");
        assert_eq!(buf, vec![0x00, 0x00]);
    }

    #[test]
    fn round_trips() {
        let mut buf = Vec::new();
        encode_str(&mut buf, "sport/tennis/player1");
        let (s, consumed) = decode_str(&buf).unwrap();
        assert_eq!(s, "sport/tennis/player1");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = [0x00, 0x05, b'h', b'i'];
        assert_eq!(decode_str(&bytes), Err(DecodeError::UnexpectedEof));
    }
}
