use crate::record::Record;
use sbuf::Sbuf;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Accepts sensor client connections and feeds decoded frames into the
/// buffer. Exactly one thread drives [`Listener::run`]; it is the only
/// caller of `Sbuf::insert`.
///
/// The listening socket is non-blocking, so the accept loop polls
/// `shutdown` between accepts rather than blocking forever on `accept()`;
/// a signal handler flipping the flag is enough to unwind it without a
/// second out-of-band wakeup mechanism.
pub struct Listener {
    socket: TcpListener,
    shutdown: Arc<AtomicBool>,
}

impl Listener {
    pub fn bind(port: u16, shutdown: Arc<AtomicBool>) -> std::io::Result<Self> {
        let socket = TcpListener::bind(("0.0.0.0", port))?;
        socket.set_nonblocking(true)?;
        info!(port, "listener bound");
        Ok(Self { socket, shutdown })
    }

    /// The address actually bound, useful when `port` was `0` (OS-assigned).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs the accept loop until `shutdown` is observed, joining every
    /// per-connection reader thread before returning. The caller is
    /// responsible for calling `Sbuf::close` after this returns, once all
    /// in-flight frames are guaranteed to have been inserted.
    pub fn run(self, buf: Arc<Sbuf<Record>>) {
        let mut handles = Vec::new();
        while !self.shutdown.load(Ordering::Acquire) {
            match self.socket.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    let buf = Arc::clone(&buf);
                    handles.push(thread::spawn(move || handle_connection(stream, &buf)));
                }
                Err(e) if would_block(&e) => {
                    thread::sleep(Duration::from_millis(50));
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            }
        }

        for handle in handles {
            let _ = handle.join();
        }
    }
}

fn would_block(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

fn handle_connection(mut stream: TcpStream, buf: &Sbuf<Record>) {
    loop {
        match Record::read_one(&mut stream) {
            Ok(Some(record)) => match buf.insert(record) {
                Ok(()) => {}
                Err(_closed) => {
                    debug!("buffer closed, dropping rest of connection");
                    return;
                }
            },
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "malformed frame, closing connection");
                return;
            }
        }
    }
}
