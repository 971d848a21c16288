use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cmdlet_common::CmdletError;
use cmdlet_common::Result;
use cmdlet_common::wire::{ServiceCall, ServiceReply};
use crossbeam_channel::Sender;
use log::{debug, error, info, warn};

/// How long a client may take to send its call line.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP receiver that accepts one service call per connection.
///
/// Each accepted connection is read up to the first newline and decoded as a
/// `ServiceCall`. Decoded calls are forwarded, together with the stream to
/// answer on, into the dispatcher channel. A connection that sends garbage is
/// answered with a `SerializationException` right here and does not affect the
/// loop.
pub struct CallReceiver {
    /// The underlying TCP listening socket.
    pub(crate) socket: TcpListener,
}

impl CallReceiver {
    /// Bind a new receiver to `bind_addr` (e.g., `127.0.0.1:4599`).
    pub fn new(bind_addr: &str) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self { socket })
    }

    /// Address the receiver is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Blocking accept loop; returns once `shutdown` is set or the dispatcher is gone.
    pub(crate) fn receive_loop_with_channel(
        self,
        tx: Sender<(ServiceCall, TcpStream)>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        info!("Endpoint is listening on {}", self.socket.local_addr()?);

        for stream in self.socket.incoming() {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("TCP connection error: {}", e);
                    continue;
                }
            };
            let peer = stream.peer_addr().ok();
            debug!("Connection from {:?}", peer);
            if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
                warn!("Cannot set read timeout for {:?}: {}", peer, e);
            }

            match read_call(&stream) {
                Ok(Some(call)) => {
                    tx.send((call, stream))
                        .map_err(|e| CmdletError::ChannelSend(e.to_string()))?;
                }
                Ok(None) => debug!("{:?} closed without sending a call", peer),
                Err(e) => {
                    warn!("Rejecting malformed call from {:?}: {}", peer, e);
                    let reply = ServiceReply::error("SerializationException", e.to_string());
                    if let Err(e) = write_reply(stream, &reply) {
                        error!("Failed to answer {:?}: {}", peer, e);
                    }
                }
            }
        }
        info!("Receiver loop stopping...");
        Ok(())
    }
}

fn read_call(stream: &TcpStream) -> Result<Option<ServiceCall>> {
    let mut line = String::new();
    if BufReader::new(stream).read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&line)?))
}

/// Writes `reply` as one line and closes the connection.
pub(crate) fn write_reply(mut stream: TcpStream, reply: &ServiceReply) -> Result<()> {
    stream.write_all(&reply.to_line()?)?;
    stream.flush()?;
    Ok(())
}
