use thiserror::Error;

/// Possible errors for the package.
#[derive(Error, Debug)]
pub enum RconError {
    /// Returned if the host is down or behind a firewall.
    #[error("host cannot be reached")]
    UnreachableHost(#[source] std::io::Error),
    /// Returned if we could not bind a local socket for the UDP transport.
    #[error("cannot bind local socket")]
    BindError(#[source] std::io::Error),
    /// Internal error used if the connection was successfully established,
    /// but there was a problem writing to the socket.
    #[error("cannot send message to host")]
    SendError(#[source] std::io::Error),
    /// Internal error used if the connection was successfully established,
    /// but there was a problem reading from the socket.
    #[error("cannot receive response from host")]
    ReceiveError(#[source] std::io::Error),
    /// Returned if you can't remember the password. The server signals this
    /// with a packet id of -1.
    #[error("authentication failed")]
    AuthenticationFailed,
    /// Returned if a UDP datagram does not start with the -1 marker. There is
    /// no recovery for the offending datagram.
    #[error("received malformed datagram")]
    MalformedDatagram,
    /// Returned from `send` on a UDP connection before the handshake is done.
    #[error("not authenticated")]
    NotAuthenticated,
    /// Returned if the configured port is zero.
    #[error("invalid port")]
    InvalidPort,
}
