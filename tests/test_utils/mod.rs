//! Loopback collector used by the integration tests.
//!
//! [`PlainTcpConnector`] skips the TLS upgrade so a bare `TcpListener` can
//! stand in for the collector and hand every received line back to the test.

use std::{
    io::{self, BufRead, BufReader},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::mpsc,
    thread,
};

use loggly_syslog::Connector;

/// Connects over plain TCP to a fixed address.
pub struct PlainTcpConnector(pub SocketAddr);

impl Connector for PlainTcpConnector {
    type Stream = TcpStream;

    fn connect(&self) -> io::Result<TcpStream> {
        TcpStream::connect(self.0)
    }
}

/// Events reported by [`spawn_collector`].
#[derive(Debug, PartialEq, Eq)]
pub enum CollectorEvent {
    Accepted(usize),
    Line(usize, String),
}

/// Accept up to `connections` clients in turn and report each line received.
pub fn spawn_collector(connections: usize) -> (SocketAddr, mpsc::Receiver<CollectorEvent>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for conn in 0..connections {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            if tx.send(CollectorEvent::Accepted(conn)).is_err() {
                return;
            }
            for line in BufReader::new(stream).lines() {
                let Ok(line) = line else { break };
                if tx.send(CollectorEvent::Line(conn, line)).is_err() {
                    return;
                }
            }
        }
    });
    (addr, rx)
}

/// Address on loopback with nothing listening.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    listener.local_addr().expect("listener has address").port()
}
