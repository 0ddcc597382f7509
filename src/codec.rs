//! Translation between wire bytes and decoded packets, for both transports.
//!
//! The TCP side is stateful: a stream read may carry half a packet, three
//! packets, or the tail of one and the head of another, so [TcpDecoder]
//! keeps the unconsumed remainder between reads. The UDP side is stateless
//! since every datagram is a complete message.

use crate::error::RconError;
use crate::packet::{Packet, PacketType};
use log::trace;

/// Size, id and type fields; the smallest prefix worth inspecting.
const HEADER_LEN: usize = 12;

/// One result from a decode pass. Discarded bytes are a diagnostic, not a
/// failure: framing continues on whatever follows them.
pub enum Decoded {
    Packet(Packet),
    Discarded(String),
}

/// Reassembles [Packet]s from a TCP stream, tolerating arbitrary
/// segmentation. Feed it chunks exactly as they arrive; it never assumes a
/// packet is complete within one read.
#[derive(Default)]
pub struct TcpDecoder {
    outstanding: Vec<u8>,
}

impl TcpDecoder {
    pub fn new() -> Self {
        TcpDecoder::default()
    }

    /// Consume one inbound chunk and return every packet (and every
    /// discarded span) it completed. Incomplete trailing bytes are carried
    /// over to the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        let mut buf = std::mem::take(&mut self.outstanding);
        buf.extend_from_slice(chunk);

        let mut decoded = Vec::new();
        let mut pos = 0;

        while buf.len() - pos >= HEADER_LEN {
            // `size` counts everything after itself, so the packet spans
            // size + 4 bytes on the wire.
            let size = read_i32(&buf, pos);
            if size <= 0 {
                decoded.push(Decoded::Discarded(format!(
                    "no valid packet header (size {size}), discarding entire buffer"
                )));
                return decoded;
            }

            let framed = size as usize + 4;
            if buf.len() - pos < framed {
                break; // wait for the full packet, TCP may have segmented it
            }

            let body_len = size - Packet::BASE_PACKET_SIZE;
            if body_len < 0 {
                decoded.push(Decoded::Discarded(format!(
                    "size {size} is too short, discarding malformed packet"
                )));
                pos += framed;
                continue;
            }

            let id = read_i32(&buf, pos + 4);
            let raw_type = read_i32(&buf, pos + 8);
            let body = &buf[pos + HEADER_LEN..pos + HEADER_LEN + body_len as usize];

            match decode_packet(id, raw_type, body) {
                Ok(packet) => {
                    trace!("decoded packet id {} ({} byte body)", id, body_len);
                    decoded.push(Decoded::Packet(packet));
                }
                Err(diagnostic) => decoded.push(Decoded::Discarded(diagnostic)),
            }

            pos += framed;
        }

        self.outstanding = buf.split_off(pos);
        decoded
    }
}

fn decode_packet(id: i32, raw_type: i32, body: &[u8]) -> Result<Packet, String> {
    let packet_type = PacketType::try_from(raw_type)
        .map_err(|t| format!("unknown packet type {t}, discarding packet"))?;
    let body = std::str::from_utf8(body)
        .map_err(|_| String::from("packet body is not valid utf-8, discarding packet"))?;

    Ok(Packet::new(
        id,
        packet_type,
        body.strip_suffix('\n').unwrap_or(body),
    ))
}

fn read_i32(buf: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

pub mod udp {
    //! The datagram variant speaks a text protocol behind a fixed -1 marker.

    use super::RconError;

    const MARKER: [u8; 4] = (-1i32).to_le_bytes();

    /// A decoded inbound datagram.
    pub enum UdpMessage {
        /// The server granted a challenge token.
        Challenge(String),
        /// Anything else: a command response with its envelope stripped.
        Response(String),
    }

    /// `rcon [token ][password ]data\n`, behind the marker.
    pub fn encode_command(token: Option<&str>, password: &str, data: &str) -> Vec<u8> {
        let mut body = String::from("rcon ");
        if let Some(token) = token {
            body.push_str(token);
            body.push(' ');
        }
        if !password.is_empty() {
            body.push_str(password);
            body.push(' ');
        }
        body.push_str(data);
        body.push('\n');
        frame(body.as_bytes())
    }

    pub fn encode_challenge_request() -> Vec<u8> {
        frame(b"challenge rcon\n")
    }

    /// The 5-byte probe used by the non-challenge handshake.
    pub fn encode_probe() -> Vec<u8> {
        frame(&[0])
    }

    pub fn decode(datagram: &[u8]) -> Result<UdpMessage, RconError> {
        if datagram.len() < 4 || datagram[..4] != MARKER {
            return Err(RconError::MalformedDatagram);
        }

        let text = String::from_utf8_lossy(&datagram[4..]);
        if let ["challenge", "rcon", token] = text.split_whitespace().collect::<Vec<_>>()[..] {
            return Ok(UdpMessage::Challenge(token.to_string()));
        }

        Ok(UdpMessage::Response(strip_envelope(&text).to_string()))
    }

    // Replies arrive wrapped in a one-byte kind marker and a trailing
    // newline plus null, e.g. `l<body>\n\0` for console prints.
    fn strip_envelope(text: &str) -> &str {
        let text = text.trim_end_matches(['\0', '\n']);
        let mut chars = text.chars();
        chars.next();
        chars.as_str()
    }

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut wire = Vec::with_capacity(4 + body.len());
        wire.extend_from_slice(&MARKER);
        wire.extend_from_slice(body);
        wire
    }
}
