//! The authentication and dispatch state machine.
//!
//! A [Session] never touches a socket: it turns decoded packets into
//! [Event]s and tells the caller what bytes open a handshake. That keeps
//! every transition testable without a server.

use crate::codec::{self, udp::UdpMessage};
use crate::error::RconError;
use crate::event::Event;
use crate::packet::{Packet, PacketType};
use log::trace;

/// Transport selection, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Tcp,
    Udp { challenge: bool },
}

pub struct Session {
    mode: Mode,
    id: i32,
    authenticated: bool,
    challenge_token: Option<String>,
}

impl Session {
    pub fn new(mode: Mode, id: i32) -> Self {
        Session {
            mode,
            id,
            authenticated: false,
            challenge_token: None,
        }
    }

    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn challenge_token(&self) -> Option<&str> {
        self.challenge_token.as_deref()
    }

    /// First bytes to put on the wire once the transport is ready, plus the
    /// event to deliver if authentication completes without a round trip
    /// (the UDP non-challenge path).
    pub fn greeting(&mut self, password: &str) -> (Vec<u8>, Option<Event>) {
        match self.mode {
            Mode::Tcp => {
                trace!("transport ready, sending auth packet");
                (
                    Packet::new(self.id, PacketType::Auth, password).pack(),
                    None,
                )
            }
            Mode::Udp { challenge: true } => {
                trace!("socket bound, requesting challenge token");
                (codec::udp::encode_challenge_request(), None)
            }
            Mode::Udp { challenge: false } => {
                trace!("socket bound, probing and assuming authenticated");
                self.authenticated = true;
                (codec::udp::encode_probe(), Some(Event::Authenticated))
            }
        }
    }

    /// Dispatch one decoded TCP packet.
    pub fn on_packet(&mut self, packet: Packet) -> Option<Event> {
        if packet.id() == self.id {
            if !self.authenticated && packet.packet_type() == PacketType::ResponseAuth {
                self.authenticated = true;
                Some(Event::Authenticated)
            } else if packet.packet_type() == PacketType::ResponseValue {
                Some(Event::Response(packet.into_body()))
            } else {
                // a 2 after auth is the command/auth-response collision
                trace!("ignoring {:?} packet for our id", packet.packet_type());
                None
            }
        } else if packet.id() == -1 {
            Some(Event::Error(RconError::AuthenticationFailed))
        } else {
            Some(Event::Server(packet.into_body()))
        }
    }

    /// Dispatch one decoded UDP datagram.
    pub fn on_datagram(&mut self, message: UdpMessage) -> Event {
        match message {
            UdpMessage::Challenge(token) => {
                trace!("challenge token granted");
                self.challenge_token = Some(token);
                self.authenticated = true;
                Event::Authenticated
            }
            UdpMessage::Response(body) => Event::Response(body),
        }
    }

    /// The transport closed. Terminal for this connection; there is no
    /// automatic reconnect.
    pub fn on_close(&mut self) -> Event {
        self.authenticated = false;
        Event::End
    }

    /// Precondition for `send`, checked synchronously at the call site: UDP
    /// commands carry the credentials inline, so there is nothing sensible
    /// to write before the handshake finished.
    pub fn check_send(&self) -> Result<(), RconError> {
        match self.mode {
            Mode::Udp { challenge }
                if !self.authenticated || (challenge && self.challenge_token.is_none()) =>
            {
                Err(RconError::NotAuthenticated)
            }
            _ => Ok(()),
        }
    }
}
