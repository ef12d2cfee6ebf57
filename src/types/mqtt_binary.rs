//! Length-prefixed binary data (MQTT 5.0 §1.5.6). Same wire shape as
//! [`super::mqtt_string`], but no UTF-8 requirement on read.

use bytes::Bytes;

use crate::error::DecodeError;

pub fn encode_binary(buf: &mut Vec<u8>, data: &[u8]) {
    let len = data.len() as u16;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(data);
}

pub fn encoded_binary_len(data: &[u8]) -> usize {
    2 + data.len()
}

pub fn decode_binary(bytes: &[u8]) -> Result<(Bytes, usize), DecodeError> {
    if bytes.len() < 2 {
        return Err(DecodeError::UnexpectedEof);
    }
    let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    if bytes.len() < 2 + len {
        return Err(DecodeError::UnexpectedEof);
    }
    Ok((Bytes::copy_from_slice(&bytes[2..2 + len]), 2 + len))
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn round_trips() {
        let mut buf = Vec::new();
        encode_binary(&mut buf, b"\x00\x01\xff");
        let (data, consumed) = decode_binary(&buf).unwrap();
        assert_eq!(&data[..], b"\x00\x01\xff");
        assert_eq!(consumed, buf.len());
    }
}
