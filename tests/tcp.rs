use srcon::client::{Client, Config};
use srcon::codec::{Decoded, TcpDecoder};
use srcon::error::RconError;
use srcon::event::Event;
use srcon::packet::{Packet, PacketType};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

/// Loopback stand-in for srcds: accepts one connection and speaks raw
/// packets, reusing the crate's own decoder to parse what the client sends.
struct TestServer {
    stream: TcpStream,
    decoder: TcpDecoder,
    pending: VecDeque<Packet>,
}

impl TestServer {
    async fn accept(listener: TcpListener) -> Self {
        let (stream, _) = listener.accept().await.expect("accept");
        TestServer {
            stream,
            decoder: TcpDecoder::new(),
            pending: VecDeque::new(),
        }
    }

    async fn read_packet(&mut self) -> Packet {
        loop {
            if let Some(packet) = self.pending.pop_front() {
                return packet;
            }
            let mut buf = [0u8; 4096];
            let n = self.stream.read(&mut buf).await.expect("read");
            assert!(n > 0, "client closed the stream early");
            for item in self.decoder.feed(&buf[..n]) {
                if let Decoded::Packet(packet) = item {
                    self.pending.push_back(packet);
                }
            }
        }
    }

    async fn write_packet(&mut self, packet: &Packet) {
        self.stream.write_all(&packet.pack()).await.expect("write");
    }
}

async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

#[tokio::test]
async fn authenticates_and_runs_a_command() {
    let (listener, port) = bind().await;

    let server = tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;

        let auth = server.read_packet().await;
        assert_eq!(auth.packet_type(), PacketType::Auth);
        assert_eq!(auth.id(), 42);
        assert_eq!(auth.body(), "hunter2");
        server
            .write_packet(&Packet::new(42, PacketType::ResponseAuth, ""))
            .await;

        let command = server.read_packet().await;
        assert_eq!(command.body(), "echo hi");
        server
            .write_packet(&Packet::new(command.id(), PacketType::ResponseValue, "hi"))
            .await;
    });

    let config = Config::new("127.0.0.1", port, "hunter2").id(42);
    let (client, mut events) = Client::connect(config).await.expect("connect");

    assert!(matches!(next_event(&mut events).await, Event::Authenticated));

    client.send("echo hi").await.expect("send");
    match next_event(&mut events).await {
        Event::Response(body) => assert_eq!(body, "hi"),
        other => panic!("expected a response, got {other:?}"),
    }

    client.disconnect();
    assert!(matches!(next_event(&mut events).await, Event::End));
    // a second disconnect is a no-op
    client.disconnect();

    server.await.expect("server task");
}

#[tokio::test]
async fn surfaces_a_rejected_password() {
    let (listener, port) = bind().await;

    tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        server.read_packet().await;
        // srcds signals a bad password by echoing id -1
        server
            .write_packet(&Packet::new(-1, PacketType::ResponseAuth, ""))
            .await;
    });

    let config = Config::new("127.0.0.1", port, "wrong").id(42);
    let (_client, mut events) = Client::connect(config).await.expect("connect");

    assert!(matches!(
        next_event(&mut events).await,
        Event::Error(RconError::AuthenticationFailed)
    ));
}

#[tokio::test]
async fn reassembles_a_response_split_across_writes() {
    let (listener, port) = bind().await;

    tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        let auth = server.read_packet().await;
        server
            .write_packet(&Packet::new(auth.id(), PacketType::ResponseAuth, ""))
            .await;

        server.read_packet().await;
        let wire = Packet::new(auth.id(), PacketType::ResponseValue, "status report").pack();
        let (head, tail) = wire.split_at(7);
        server.stream.write_all(head).await.expect("write head");
        server.stream.flush().await.expect("flush");
        sleep(Duration::from_millis(50)).await;
        server.stream.write_all(tail).await.expect("write tail");
    });

    let config = Config::new("127.0.0.1", port, "hunter2").id(7);
    let (client, mut events) = Client::connect(config).await.expect("connect");

    assert!(matches!(next_event(&mut events).await, Event::Authenticated));
    client.send("status").await.expect("send");

    match next_event(&mut events).await {
        Event::Response(body) => assert_eq!(body, "status report"),
        other => panic!("expected a response, got {other:?}"),
    }
}

#[tokio::test]
async fn foreign_ids_arrive_as_server_messages() {
    let (listener, port) = bind().await;

    tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        let auth = server.read_packet().await;
        server
            .write_packet(&Packet::new(auth.id(), PacketType::ResponseAuth, ""))
            .await;
        server
            .write_packet(&Packet::new(9000, PacketType::ResponseValue, "restart in 5"))
            .await;
    });

    let config = Config::new("127.0.0.1", port, "hunter2").id(42);
    let (_client, mut events) = Client::connect(config).await.expect("connect");

    assert!(matches!(next_event(&mut events).await, Event::Authenticated));
    match next_event(&mut events).await {
        Event::Server(body) => assert_eq!(body, "restart in 5"),
        other => panic!("expected a server message, got {other:?}"),
    }
}

#[tokio::test]
async fn remote_close_ends_the_connection() {
    let (listener, port) = bind().await;

    tokio::spawn(async move {
        let mut server = TestServer::accept(listener).await;
        let auth = server.read_packet().await;
        server
            .write_packet(&Packet::new(auth.id(), PacketType::ResponseAuth, ""))
            .await;
        // dropping the stream closes it
    });

    let config = Config::new("127.0.0.1", port, "hunter2").id(42);
    let (_client, mut events) = Client::connect(config).await.expect("connect");

    assert!(matches!(next_event(&mut events).await, Event::Authenticated));
    assert!(matches!(next_event(&mut events).await, Event::End));
}

#[tokio::test]
async fn rejects_port_zero() {
    let config = Config::new("127.0.0.1", 0, "hunter2");
    assert!(matches!(
        Client::connect(config).await,
        Err(RconError::InvalidPort)
    ));
}
