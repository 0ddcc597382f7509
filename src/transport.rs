//! The socket layer: one stream or one datagram socket per connection,
//! picked at construction time.

use crate::error::RconError;
use crate::session::Mode;
use log::trace;
use std::io::ErrorKind;
use tokio::net::{TcpStream, UdpSocket};

pub enum Transport {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

impl Transport {
    /// Establish the connection: a TCP stream to the remote, or a UDP socket
    /// bound to an ephemeral local port and connected to the remote so sends
    /// and receives only ever address that endpoint.
    pub async fn open(host: &str, port: u16, mode: Mode) -> Result<Self, RconError> {
        let addr = format!("{host}:{port}");
        match mode {
            Mode::Tcp => {
                let stream = TcpStream::connect(&addr)
                    .await
                    .map_err(RconError::UnreachableHost)?;
                trace!("opened tcp stream to {}", addr);
                Ok(Transport::Tcp(stream))
            }
            Mode::Udp { .. } => {
                let socket = UdpSocket::bind("0.0.0.0:0")
                    .await
                    .map_err(RconError::BindError)?;
                socket
                    .connect(&addr)
                    .await
                    .map_err(RconError::UnreachableHost)?;
                trace!("bound udp socket for {}", addr);
                Ok(Transport::Udp(socket))
            }
        }
    }

    /// Write raw bytes to the remote: the whole buffer on a stream, one
    /// datagram on a socket.
    pub async fn send(&self, bytes: &[u8]) -> Result<(), RconError> {
        match self {
            Transport::Tcp(stream) => {
                let mut written = 0;
                while written < bytes.len() {
                    stream.writable().await.map_err(RconError::SendError)?;
                    match stream.try_write(&bytes[written..]) {
                        Ok(n) => written += n,
                        Err(ref e) if e.kind() == ErrorKind::WouldBlock => continue,
                        Err(e) => return Err(RconError::SendError(e)),
                    }
                }
                Ok(())
            }
            Transport::Udp(socket) => loop {
                socket.writable().await.map_err(RconError::SendError)?;
                match socket.try_send(bytes) {
                    Ok(_) => return Ok(()),
                    Err(ref e) if e.kind() == ErrorKind::WouldBlock => continue,
                    Err(e) => return Err(RconError::SendError(e)),
                }
            },
        }
    }

    /// Read one chunk from the remote. TCP chunks are arbitrary stream
    /// segments (0 bytes means the remote closed); UDP reads are always one
    /// complete datagram.
    pub async fn recv(&self, buf: &mut [u8]) -> Result<usize, RconError> {
        match self {
            Transport::Tcp(stream) => loop {
                stream.readable().await.map_err(RconError::ReceiveError)?;
                match stream.try_read(buf) {
                    Ok(n) => return Ok(n),
                    Err(ref e) if e.kind() == ErrorKind::WouldBlock => continue,
                    Err(e) => return Err(RconError::ReceiveError(e)),
                }
            },
            Transport::Udp(socket) => loop {
                socket.readable().await.map_err(RconError::ReceiveError)?;
                match socket.try_recv(buf) {
                    Ok(n) => return Ok(n),
                    Err(ref e) if e.kind() == ErrorKind::WouldBlock => continue,
                    Err(e) => return Err(RconError::ReceiveError(e)),
                }
            },
        }
    }
}
