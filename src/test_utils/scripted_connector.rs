//! An in-memory [`Connector`] whose connect and write outcomes are scripted.
//!
//! Every stream it hands out appends to one shared buffer, so tests can
//! assert on the exact bytes that would have reached the collector and count
//! how many connections were attempted.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;

use crate::connection::{Connector, Transport};

/// Largest slice a single `write` call accepts, so a packet spans many calls.
const MAX_WRITE: usize = 16;

/// What the next connect attempt does.
#[derive(Clone, Copy, Debug)]
pub enum Outcome {
    /// Connect and accept writes.
    Accept,
    /// Refuse the connection.
    Refuse,
    /// Connect, then fail every write.
    BreakOnWrite,
}

#[derive(Clone, Default)]
pub struct Probe {
    attempts: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    wire: Arc<Mutex<Vec<u8>>>,
}

impl Probe {
    /// Number of connect attempts made so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of streams closed gracefully.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Everything successfully written, as text.
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.wire.lock()).into_owned()
    }

    /// Successfully written lines.
    pub fn lines(&self) -> Vec<String> {
        self.written().lines().map(str::to_owned).collect()
    }
}

pub struct ScriptedConnector {
    script: Mutex<VecDeque<Outcome>>,
    probe: Probe,
}

impl ScriptedConnector {
    /// Follow `script` in order, then accept every further connect.
    pub fn new(script: impl IntoIterator<Item = Outcome>) -> (Self, Probe) {
        let probe = Probe::default();
        let connector = Self {
            script: Mutex::new(script.into_iter().collect()),
            probe: probe.clone(),
        };
        (connector, probe)
    }
}

pub struct ScriptedStream {
    fail_writes: bool,
    probe: Probe,
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        let accepted = buf.len().min(MAX_WRITE);
        self.probe.wire.lock().extend_from_slice(&buf[..accepted]);
        thread::yield_now();
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptedStream {
    fn close(&mut self) -> io::Result<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Connector for ScriptedConnector {
    type Stream = ScriptedStream;

    fn connect(&self) -> io::Result<Self::Stream> {
        self.probe.attempts.fetch_add(1, Ordering::SeqCst);
        let outcome = self.script.lock().pop_front().unwrap_or(Outcome::Accept);
        match outcome {
            Outcome::Refuse => Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
            Outcome::Accept | Outcome::BreakOnWrite => Ok(ScriptedStream {
                fail_writes: matches!(outcome, Outcome::BreakOnWrite),
                probe: self.probe.clone(),
            }),
        }
    }
}
