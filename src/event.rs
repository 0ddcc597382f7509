use crate::error::RconError;

/// Notifications delivered over the channel returned by
/// [Client::connect](crate::client::Client::connect), in the order they
/// occurred on the wire.
#[derive(Debug)]
pub enum Event {
    /// The handshake completed; the server will now accept commands.
    Authenticated,
    /// Body of a reply to a command this client sent.
    Response(String),
    /// An unsolicited message from the server (ping/pong likely).
    Server(String),
    /// A socket or protocol failure.
    Error(RconError),
    /// A recoverable decode diagnostic; the offending bytes were discarded.
    Debug(String),
    /// The connection closed. Always the last event for a connection.
    End,
}
