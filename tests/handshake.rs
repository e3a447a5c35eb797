#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Validation over a real socket: a scrambled reply is accepted, anything
//! else is closed before the connection becomes visible to the application.

use netframe::config::ServerConfig;
use netframe::protocol::handshake::scramble;
use netframe::{Message, MessageId, Server, ServerConnection, ServerHandler};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireId {
    Ping,
}

impl MessageId for WireId {
    fn to_u32(self) -> u32 {
        self as u32
    }

    fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(WireId::Ping),
            _ => None,
        }
    }
}

#[derive(Clone, Default)]
struct Recorder {
    validated: Arc<Mutex<Vec<u32>>>,
    messages: Arc<Mutex<Vec<u32>>>,
}

impl ServerHandler<WireId> for Recorder {
    fn on_client_connect(&self, _connection: &Arc<ServerConnection<WireId>>) -> bool {
        true
    }

    fn on_client_validated(&self, connection: &Arc<ServerConnection<WireId>>) {
        self.validated.lock().unwrap().push(connection.id());
    }

    fn on_message(&self, connection: &Arc<ServerConnection<WireId>>, _message: Message<WireId>) {
        self.messages.lock().unwrap().push(connection.id());
    }
}

fn start_server(recorder: &Recorder) -> (Server<WireId>, std::net::SocketAddr) {
    let config = ServerConfig {
        address: "127.0.0.1".to_string(),
        port: 0,
    };
    let mut server = Server::new(config, recorder.clone());
    server.start().unwrap();
    let addr = server.local_addr().unwrap();
    (server, addr)
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn scrambled_reply_validates_the_connection() {
    let recorder = Recorder::default();
    let (_server, addr) = start_server(&recorder);

    let mut socket = TcpStream::connect(addr).unwrap();
    let mut challenge = [0u8; 8];
    socket.read_exact(&mut challenge).unwrap();

    let reply = scramble(u64::from_ne_bytes(challenge));
    socket.write_all(&reply.to_ne_bytes()).unwrap();

    assert!(
        wait_until(Duration::from_secs(5), || {
            recorder.validated.lock().unwrap().as_slice() == [10_000]
        }),
        "validated hook never fired"
    );
}

#[test]
fn wrong_reply_is_closed_without_any_hook() {
    let recorder = Recorder::default();
    let (server, addr) = start_server(&recorder);

    let mut socket = TcpStream::connect(addr).unwrap();
    socket
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut challenge = [0u8; 8];
    socket.read_exact(&mut challenge).unwrap();

    // Echoing the raw challenge back is never the scrambled value
    socket.write_all(&challenge).unwrap();

    // A framed message after the bad reply must never surface either; the
    // write may fail once the server has already closed, which is fine.
    let mut msg = Message::new(WireId::Ping);
    msg.push(1u32);
    let _ = socket.write_all(&msg.header.to_bytes());
    let _ = socket.write_all(&msg.body);

    // The server closes the socket: the next read sees EOF, or a reset if
    // our trailing bytes arrived after the close
    let mut probe = [0u8; 1];
    assert!(
        wait_until(Duration::from_secs(5), || match socket.read(&mut probe) {
            Ok(0) => true,
            Ok(_) => false,
            Err(error) => !matches!(
                error.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
        }),
        "server never closed the socket"
    );

    server.update(usize::MAX, false);
    assert!(recorder.validated.lock().unwrap().is_empty());
    assert!(recorder.messages.lock().unwrap().is_empty());
}

#[test]
fn each_connection_gets_its_own_challenge() {
    let recorder = Recorder::default();
    let (_server, addr) = start_server(&recorder);

    let mut first = [0u8; 8];
    let mut second = [0u8; 8];
    let mut socket_a = TcpStream::connect(addr).unwrap();
    let mut socket_b = TcpStream::connect(addr).unwrap();
    socket_a.read_exact(&mut first).unwrap();
    socket_b.read_exact(&mut second).unwrap();

    assert_ne!(first, second);
}
