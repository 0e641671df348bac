//! TCP ingress gateway - decodes FIX byte streams into the order queue.
//!
//! Binds an IPv4 listener with `SO_REUSEADDR`, accepts on a dedicated
//! thread, and runs one handler thread per connection. The SPSC producer is
//! parked in a slot: the first connection takes it, later connections are
//! refused until the active handler returns it, keeping the queue contract
//! at exactly one producer.

use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fix::{self, Decoded};
use crate::order::Order;
use crate::queue::Producer;

const LISTEN_BACKLOG: i32 = 5;
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Rolling receive buffer size per connection.
const BUFFER_SIZE: usize = 4096;

/// Fatal gateway startup failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to create listener socket")]
    Create(#[source] io::Error),
    #[error("failed to bind to port")]
    Bind(#[source] io::Error),
    #[error("failed to listen")]
    Listen(#[source] io::Error),
    #[error("failed to spawn accept thread")]
    Spawn(#[source] io::Error),
}

/// TCP order gateway; producer side of the engine queue.
pub struct OrderGateway {
    port: u16,
    running: Arc<AtomicBool>,
    producer: Arc<Mutex<Option<Producer<Order>>>>,
    accept_thread: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl OrderGateway {
    /// Create a gateway that will listen on `port` (0 picks an ephemeral
    /// port) and feed decoded orders through `producer`. The shared
    /// `running` flag gates the accept loop and all client handlers.
    pub fn new(port: u16, producer: Producer<Order>, running: Arc<AtomicBool>) -> Self {
        Self {
            port,
            running,
            producer: Arc::new(Mutex::new(Some(producer))),
            accept_thread: None,
            local_addr: None,
        }
    }

    /// Bind, listen and start the accept thread.
    pub fn start(&mut self) -> Result<(), GatewayError> {
        let socket =
            Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(GatewayError::Create)?;
        socket.set_reuse_address(true).map_err(GatewayError::Create)?;

        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port));
        socket.bind(&addr.into()).map_err(GatewayError::Bind)?;
        socket.listen(LISTEN_BACKLOG).map_err(GatewayError::Listen)?;
        // Non-blocking accept so the loop can observe shutdown.
        socket.set_nonblocking(true).map_err(GatewayError::Listen)?;

        let listener: TcpListener = socket.into();
        let local = listener.local_addr().map_err(GatewayError::Listen)?;
        self.local_addr = Some(local);
        info!(addr = %local, "gateway listening");

        let running = Arc::clone(&self.running);
        let producer_slot = Arc::clone(&self.producer);
        let handle = thread::Builder::new()
            .name("gateway-accept".into())
            .spawn(move || accept_loop(listener, running, producer_slot))
            .map_err(GatewayError::Spawn)?;
        self.accept_thread = Some(handle);

        Ok(())
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Clear the running flag and join the accept thread (which joins its
    /// client handlers).
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for OrderGateway {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(
    listener: TcpListener,
    running: Arc<AtomicBool>,
    producer_slot: Arc<Mutex<Option<Producer<Order>>>>,
) {
    let mut handlers: Vec<JoinHandle<()>> = Vec::new();

    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                let taken = producer_slot.lock().expect("producer slot poisoned").take();
                match taken {
                    Some(producer) => {
                        info!(%peer, "client connected");
                        let running = Arc::clone(&running);
                        let slot = Arc::clone(&producer_slot);
                        let handle = thread::Builder::new()
                            .name("gateway-client".into())
                            .spawn(move || {
                                let producer = handle_client(stream, producer, &running);
                                // Hand the producer back for the next client.
                                *slot.lock().expect("producer slot poisoned") = Some(producer);
                            });
                        match handle {
                            Ok(handle) => handlers.push(handle),
                            Err(e) => warn!(error = %e, "failed to spawn client handler"),
                        }
                    }
                    None => {
                        // SPSC queue: exactly one producer at a time.
                        warn!(%peer, "a client is already streaming orders; refusing connection");
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                if running.load(Ordering::Relaxed) {
                    warn!(error = %e, "accept failed; retrying");
                }
            }
        }
    }

    for handle in handlers {
        let _ = handle.join();
    }
    debug!("accept loop exited");
}

/// Read the FIX byte stream into a rolling buffer, decode complete frames
/// and push the resulting orders with bounded backpressure. Returns the
/// producer so the gateway can serve a later connection.
fn handle_client(
    mut stream: TcpStream,
    mut producer: Producer<Order>,
    running: &AtomicBool,
) -> Producer<Order> {
    // A read timeout lets the handler observe shutdown while the peer is
    // idle but still connected.
    if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
        warn!(error = %e, "failed to set read timeout");
    }

    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut offset = 0usize;

    'connection: while running.load(Ordering::Relaxed) {
        let bytes_read = match stream.read(&mut buffer[offset..]) {
            Ok(0) => break, // orderly close
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(e) => {
                warn!(error = %e, "client read failed");
                break;
            }
        };

        let total = offset + bytes_read;
        let mut processed = 0usize;

        while processed < total {
            match fix::decode(&buffer[processed..total]) {
                Decoded::Incomplete => break,
                Decoded::Skipped { consumed } => processed += consumed,
                Decoded::NewOrder { order, consumed } => {
                    // Queue full: yield and retry, never drop.
                    while !producer.push(order) {
                        if !running.load(Ordering::Relaxed) {
                            break 'connection;
                        }
                        thread::yield_now();
                    }
                    processed += consumed;
                }
            }
        }

        // Carry any incomplete frame suffix over to the next read.
        if processed < total {
            buffer.copy_within(processed..total, 0);
            offset = total - processed;
        } else {
            offset = 0;
        }
    }

    debug!("client handler exiting");
    producer
}
