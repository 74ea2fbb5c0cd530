//! TCP and TLS transport primitives.

use std::{
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use log::debug;
use native_tls::TlsStream;

use crate::config::{LogglyConfig, TlsOptions};

/// A connected byte stream owned by the connection manager.
pub trait Transport: Write + Send {
    /// Close the stream, including the underlying socket.
    fn close(&mut self) -> io::Result<()>;
}

/// Opens new transports on demand.
pub trait Connector: Send + Sync {
    type Stream: Transport;

    /// Establish a fresh connection. Called only when none is held.
    fn connect(&self) -> io::Result<Self::Stream>;
}

impl Transport for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

/// The TLS session owns its TCP socket, so closing or dropping it closes the
/// socket as well.
impl Transport for TlsStream<TcpStream> {
    fn close(&mut self) -> io::Result<()> {
        let notify = self.shutdown();
        let socket = self.get_ref().shutdown(Shutdown::Both);
        notify.and(socket)
    }
}

/// Connects to the collector over TCP and upgrades to TLS.
#[derive(Clone, Debug)]
pub struct TlsConnector {
    host: String,
    port: u16,
    tls: TlsOptions,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl TlsConnector {
    pub fn new(config: &LogglyConfig) -> Self {
        Self {
            host: config.host().to_owned(),
            port: config.port(),
            tls: config.tls().clone(),
            connect_timeout: config.connect_timeout(),
            write_timeout: config.write_timeout(),
        }
    }

    fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|iter| iter.collect())
    }

    fn tls_connector(&self) -> io::Result<native_tls::TlsConnector> {
        let mut builder = native_tls::TlsConnector::builder();
        if self.tls.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }

    fn connect_tcp(&self) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in self.socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses resolved for {}:{}", self.host, self.port),
            )
        }))
    }
}

impl Connector for TlsConnector {
    type Stream = TlsStream<TcpStream>;

    fn connect(&self) -> io::Result<Self::Stream> {
        let stream = self.connect_tcp()?;
        debug!("enabling ssl for socket {}:{}", self.host, self.port);
        let connector = self.tls_connector()?;
        stream.set_read_timeout(Some(self.connect_timeout))?;
        stream.set_write_timeout(Some(self.connect_timeout))?;
        let stream = connector
            .connect(&self.tls.domain, stream)
            .map_err(io::Error::other)?;
        let tcp_ref = stream.get_ref();
        tcp_ref.set_read_timeout(None)?;
        tcp_ref.set_write_timeout(Some(self.write_timeout))?;
        Ok(stream)
    }
}
