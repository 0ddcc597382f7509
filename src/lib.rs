//! Pure Rust async implementation of the [Source RCON protocol](https://developer.valvesoftware.com/wiki/Source_RCON_Protocol),
//! covering both the TCP variant (length-prefixed stream packets) and the
//! older UDP variant (challenge-token authenticated datagrams).
pub mod client;
pub mod codec;
pub mod error;
pub mod event;
pub mod packet;
pub mod session;
pub mod transport;
