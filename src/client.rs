use crate::{
    codec::{udp, Decoded, TcpDecoder},
    error::RconError,
    event::Event,
    packet::{Packet, PacketType},
    session::{Mode, Session},
    transport::Transport,
};
use log::{debug, trace};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify};

/// Connection settings. The password is deliberately left out of the
/// [Debug] output and is never logged anywhere in the crate.
pub struct Config {
    host: String,
    port: u16,
    password: String,
    mode: Mode,
    id: i32,
}

impl Config {
    /// A TCP connection with a process-derived packet id. Switch transports
    /// with [Config::udp] and pin the id with [Config::id].
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Config {
            host: host.into(),
            port,
            password: password.into(),
            mode: Mode::Tcp,
            id: (std::process::id() & 0x7FFF_FFFF) as i32,
        }
    }

    /// Use the UDP transport, with or without the challenge handshake.
    pub fn udp(mut self, challenge: bool) -> Self {
        self.mode = Mode::Udp { challenge };
        self
    }

    pub fn id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("mode", &self.mode)
            .field("id", &self.id)
            .finish()
    }
}

/// Asynchronous rcon client. [Client::connect] establishes the connection,
/// starts the handshake and returns together with the event channel; wait
/// for [Event::Authenticated] before sending commands.
///
/// ## Example
/// ```no_run
/// use srcon::client::{Client, Config};
/// use srcon::event::Event;
/// use std::error::Error;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn Error>> {
///     let config = Config::new("dev.viora.sh", 27016, "<put rcon password here>");
///     let (client, mut events) = Client::connect(config).await?;
///
///     while let Some(event) = events.recv().await {
///         match event {
///             Event::Authenticated => client.send("echo hi").await?,
///             Event::Response(body) => {
///                 assert_eq!(body, "hi");
///                 break;
///             }
///             _ => {}
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct Client {
    transport: Arc<Transport>,
    session: Arc<Mutex<Session>>,
    shutdown: Arc<Notify>,
    closed: AtomicBool,
    config: Config,
}

impl Client {
    /// Open the configured transport, send the handshake greeting and spawn
    /// the reader task. Returns before authentication completes; the
    /// handshake outcome arrives on the event channel.
    pub async fn connect(
        config: Config,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Event>), RconError> {
        if config.port == 0 {
            return Err(RconError::InvalidPort);
        }

        let transport = Arc::new(Transport::open(&config.host, config.port, config.mode).await?);
        let session = Arc::new(Mutex::new(Session::new(config.mode, config.id)));
        let (events, receiver) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());

        {
            let mut session = session.lock().await;
            let (greeting, event) = session.greeting(&config.password);
            transport.send(&greeting).await?;
            if let Some(event) = event {
                let _ = events.send(event);
            }
        }
        trace!("greeting sent, handshake in progress");

        tokio::spawn(run(
            transport.clone(),
            session.clone(),
            events,
            shutdown.clone(),
            config.mode,
        ));

        Ok((
            Client {
                transport,
                session,
                shutdown,
                closed: AtomicBool::new(false),
                config,
            },
            receiver,
        ))
    }

    /// Run a command with the configured id.
    pub async fn send(&self, data: &str) -> Result<(), RconError> {
        self.send_with(data, PacketType::Command, self.config.id)
            .await
    }

    /// Run a command with an explicit packet type and id. On UDP this fails
    /// with [RconError::NotAuthenticated] until the handshake finished (and,
    /// in challenge mode, a token arrived); nothing is written in that case.
    pub async fn send_with(
        &self,
        data: &str,
        packet_type: PacketType,
        id: i32,
    ) -> Result<(), RconError> {
        let bytes = match self.config.mode {
            Mode::Tcp => Packet::new(id, packet_type, data).pack(),
            Mode::Udp { .. } => {
                let session = self.session.lock().await;
                session.check_send()?;
                udp::encode_command(session.challenge_token(), &self.config.password, data)
            }
        };

        trace!("sending {} bytes", bytes.len());
        self.transport.send(&bytes).await
    }

    /// Tear the connection down. The reader task emits a final [Event::End]
    /// and stops; calling this again (or after the remote already closed)
    /// does nothing.
    pub fn disconnect(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            trace!("disconnect requested");
            self.shutdown.notify_one();
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Reader task: pull chunks off the transport, decode, dispatch. Each chunk
/// is processed to completion before the next read, so session state sees
/// packets strictly in wire order.
async fn run(
    transport: Arc<Transport>,
    session: Arc<Mutex<Session>>,
    events: mpsc::UnboundedSender<Event>,
    shutdown: Arc<Notify>,
    mode: Mode,
) {
    let mut decoder = TcpDecoder::new();
    let mut buf = [0u8; 4096];

    loop {
        let read = tokio::select! {
            _ = shutdown.notified() => break,
            read = transport.recv(&mut buf) => read,
        };

        match read {
            Ok(0) if mode == Mode::Tcp => {
                trace!("remote closed the stream");
                break;
            }
            Ok(n) => match mode {
                Mode::Tcp => {
                    for item in decoder.feed(&buf[..n]) {
                        let event = match item {
                            Decoded::Packet(packet) => session.lock().await.on_packet(packet),
                            Decoded::Discarded(diagnostic) => {
                                debug!("{diagnostic}");
                                Some(Event::Debug(diagnostic))
                            }
                        };
                        if let Some(event) = event {
                            let _ = events.send(event);
                        }
                    }
                }
                Mode::Udp { .. } => {
                    // a bad marker poisons only this datagram
                    let event = match udp::decode(&buf[..n]) {
                        Ok(message) => session.lock().await.on_datagram(message),
                        Err(e) => Event::Error(e),
                    };
                    let _ = events.send(event);
                }
            },
            Err(e) => {
                let _ = events.send(Event::Error(e));
                break;
            }
        }
    }

    let end = session.lock().await.on_close();
    let _ = events.send(end);
}
