//! Loopback test harness: an in-memory duplex pipe standing in for a real
//! socket, with one end wrapped as a [`mqtt_client::Transport`] for the
//! client under test and the other driven directly by the test as a stub
//! broker. Packet bytes are built and parsed by hand at the byte level
//! since the wire codec is a private implementation detail of the crate
//! under test, not part of its public API.

#![allow(dead_code)]

use std::time::Duration;

use mqtt_client::Transport;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

pub const CONNECT: u8 = 1;
pub const CONNACK: u8 = 2;
pub const PUBLISH: u8 = 3;
pub const PUBACK: u8 = 4;
pub const PUBREC: u8 = 5;
pub const PUBREL: u8 = 6;
pub const PUBCOMP: u8 = 7;
pub const SUBSCRIBE: u8 = 8;
pub const SUBACK: u8 = 9;
pub const UNSUBSCRIBE: u8 = 10;
pub const UNSUBACK: u8 = 11;
pub const PINGREQ: u8 = 12;
pub const PINGRESP: u8 = 13;
pub const DISCONNECT: u8 = 14;

/// How long any single read/write in a test is allowed to block before the
/// test is considered hung rather than merely slow.
const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// The client side of the loopback pipe, implementing `Transport`. Each
/// `open()` call hands out the next pre-queued `DuplexStream` end, mirroring
/// a real transport where reconnecting after a disconnect establishes a
/// fresh socket rather than reusing the old one.
pub struct MemoryTransport {
    connects: mpsc::UnboundedReceiver<DuplexStream>,
    stream: Option<DuplexStream>,
}

impl Transport for MemoryTransport {
    type Error = std::io::Error;

    async fn open(&mut self) -> Result<(), Self::Error> {
        let stream = self
            .connects
            .recv()
            .await
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "no broker waiting to accept"))?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.stream_mut()?.write_all(bytes).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream_mut()?.read(buf).await
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        Ok(())
    }
}

impl MemoryTransport {
    fn stream_mut(&mut self) -> Result<&mut DuplexStream, std::io::Error> {
        self.stream
            .as_mut()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotConnected, "transport not open"))
    }
}

/// Hands out a fresh loopback connection on each accept, so a test can drive
/// a client through several connect/disconnect cycles against one transport.
pub struct MockBroker {
    connects: mpsc::UnboundedSender<DuplexStream>,
}

impl MockBroker {
    /// Queues a new connection for the next `Transport::open` call and
    /// returns the broker-side stub for it. Safe to call before the client
    /// actually connects; the stream sits in the channel until `open` reads it.
    pub fn accept(&self) -> FakeBroker {
        let (client_end, broker_end) = tokio::io::duplex(16 * 1024);
        let _ = self.connects.send(client_end);
        FakeBroker { stream: broker_end, buf: Vec::new() }
    }
}

/// Builds a transport and its broker-side controller for tests that drive
/// more than one connect/disconnect cycle.
pub fn reconnecting_pair() -> (MemoryTransport, MockBroker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MemoryTransport { connects: rx, stream: None }, MockBroker { connects: tx })
}

/// The broker side of the loopback pipe: reads whatever the client writes
/// and lets the test hand-craft replies.
pub struct FakeBroker {
    stream: DuplexStream,
    buf: Vec<u8>,
}

impl FakeBroker {
    pub async fn send(&mut self, bytes: &[u8]) {
        timeout(STEP_TIMEOUT, self.stream.write_all(bytes)).await.expect("broker write timed out").unwrap();
    }

    /// Closes the broker's end, surfacing as a `read() == Ok(0)` on the
    /// client's transport (an orderly close, per `Transport::read`'s docs).
    pub async fn hang_up(mut self) {
        let _ = self.stream.shutdown().await;
    }

    /// Reads one full control packet frame: `(packet_type, flags, body)`.
    /// Blocks until a complete frame has arrived.
    pub async fn recv_frame(&mut self) -> (u8, u8, Vec<u8>) {
        loop {
            if let Some(frame) = try_take_frame(&mut self.buf) {
                return frame;
            }
            let mut chunk = [0u8; 4096];
            let n = timeout(STEP_TIMEOUT, self.stream.read(&mut chunk))
                .await
                .expect("broker read timed out")
                .unwrap();
            assert_ne!(n, 0, "client closed the connection while the broker was still expecting a frame");
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Builds a loopback pipe for tests that only ever connect once: the
/// connection is pre-queued, so the first `Transport::open` resolves
/// immediately.
pub fn pair() -> (MemoryTransport, FakeBroker) {
    let (transport, broker) = reconnecting_pair();
    let broker = broker.accept();
    (transport, broker)
}

fn decode_varint(bytes: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    let mut multiplier: u32 = 1;
    for (i, &byte) in bytes.iter().enumerate() {
        if i == 4 {
            return None;
        }
        value += (byte & 0x7F) as u32 * multiplier;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        multiplier *= 128;
    }
    None
}

fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value % 128) as u8;
        value /= 128;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

fn try_take_frame(buf: &mut Vec<u8>) -> Option<(u8, u8, Vec<u8>)> {
    if buf.is_empty() {
        return None;
    }
    let first = buf[0];
    let (len, len_bytes) = decode_varint(&buf[1..])?;
    let header_len = 1 + len_bytes;
    let total = header_len + len as usize;
    if buf.len() < total {
        return None;
    }
    let body = buf[header_len..total].to_vec();
    buf.drain(..total);
    Some((first >> 4, first & 0x0F, body))
}

fn frame(packet_type: u8, flags: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + body.len());
    out.push((packet_type << 4) | flags);
    encode_varint(body.len() as u32, &mut out);
    out.extend_from_slice(body);
    out
}

fn str_bytes(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + s.len());
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
    out
}

/// A v5 CONNACK with no properties beyond the mandatory empty list.
pub fn connack(session_present: bool, reason: u8) -> Vec<u8> {
    let body = [if session_present { 0x01 } else { 0x00 }, reason, 0x00];
    frame(CONNACK, 0, &body)
}

pub fn puback(id: u16) -> Vec<u8> {
    frame(PUBACK, 0, &id.to_be_bytes())
}

pub fn pubrec(id: u16) -> Vec<u8> {
    frame(PUBREC, 0, &id.to_be_bytes())
}

pub fn pubrel(id: u16) -> Vec<u8> {
    frame(PUBREL, 0b0010, &id.to_be_bytes())
}

pub fn pubcomp(id: u16) -> Vec<u8> {
    frame(PUBCOMP, 0, &id.to_be_bytes())
}

pub fn suback(id: u16, reason_codes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&id.to_be_bytes());
    body.push(0x00);
    body.extend_from_slice(reason_codes);
    frame(SUBACK, 0, &body)
}

pub fn unsuback(id: u16, reason_codes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&id.to_be_bytes());
    body.push(0x00);
    body.extend_from_slice(reason_codes);
    frame(UNSUBACK, 0, &body)
}

pub fn pingresp() -> Vec<u8> {
    frame(PINGRESP, 0, &[])
}

/// A v5 PUBLISH, with an empty (no-op) property list.
pub fn publish(topic: &str, payload: &[u8], qos: u8, retain: bool, dup: bool, id: Option<u16>) -> Vec<u8> {
    let mut flags = qos << 1;
    if retain {
        flags |= 0x01;
    }
    if dup {
        flags |= 0x08;
    }
    let mut body = str_bytes(topic);
    if qos != 0 {
        body.extend_from_slice(&id.expect("QoS > 0 requires a packet id").to_be_bytes());
    }
    body.push(0x00);
    body.extend_from_slice(payload);
    frame(PUBLISH, flags, &body)
}

/// Extracts the 2-byte packet identifier immediately following the fixed
/// header of a SUBSCRIBE/UNSUBSCRIBE/PUBLISH(QoS>0) body.
pub fn packet_id_of(body: &[u8]) -> u16 {
    u16::from_be_bytes([body[0], body[1]])
}

/// Whether a decoded CONNECT body's Connect Flags byte has the Will Flag
/// set, alongside the retain/QoS bits packed into the same byte.
pub fn connect_will_flags(body: &[u8]) -> Option<(bool, u8, bool)> {
    let (_protocol_name, mut offset) = {
        let len = u16::from_be_bytes([body[0], body[1]]) as usize;
        (&body[2..2 + len], 2 + len)
    };
    offset += 1; // protocol level
    let flags = body[offset];
    if flags & 0x04 == 0 {
        return None;
    }
    let qos = (flags >> 3) & 0x03;
    let retain = flags & 0x20 != 0;
    Some((true, qos, retain))
}
