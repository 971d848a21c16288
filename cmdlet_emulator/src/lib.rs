//! Local endpoint emulating the services behind the cmdlet catalog.
//!
//! The emulator wires together three pieces:
//!
//! - `CallReceiver` — accepts TCP connections, decodes one `ServiceCall` per
//!   connection, and forwards it with the stream over a `crossbeam_channel`.
//! - The dispatcher loop — multiplexes incoming calls and the stop signal with
//!   `select!`, runs each call against the shared `Store`, and writes the reply.
//! - `FaultPlan` — optionally fails every call after the first N, to exercise
//!   client behavior when a later page request fails.
//!
//! Listings page through deterministic fixture data with opaque tokens (see
//! `pagination`), so page boundaries are reproducible across runs.
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use cmdlet_common::Result;
use cmdlet_common::wire::{ServiceCall, ServiceReply};
use cmdlet_common::{CmdletError, ServiceId};
use crossbeam_channel::{Receiver, Sender, select, unbounded};
use log::{error, info, warn};
use strum::IntoEnumIterator;

use crate::fault::FaultPlan;
use crate::receiver::{CallReceiver, write_reply};
use crate::services::{Limits, dispatch};
use crate::store::Store;

pub mod fault;
pub mod pagination;
mod receiver;
pub mod services;
pub mod store;

/// Page size used when a request does not name one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Emulator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatorOptions {
    /// Page size when a request names none; clamped to `1..=pagination::MAX_PAGE_SIZE`.
    pub page_size: usize,
    /// Fail every call after this many.
    pub fail_after: Option<usize>,
}

impl Default for EmulatorOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fail_after: None,
        }
    }
}

/// A bound, not yet running emulator.
pub struct Emulator {
    receiver: CallReceiver,
    store: Arc<Mutex<Store>>,
    options: EmulatorOptions,
}

impl Emulator {
    /// Binds to `addr` with the seeded fixture.
    pub fn bind(addr: &str, options: EmulatorOptions) -> Result<Self> {
        Ok(Self {
            receiver: CallReceiver::new(addr)?,
            store: Arc::new(Mutex::new(Store::seeded())),
            options,
        })
    }

    /// Address the emulator is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.receiver.local_addr()
    }

    /// Starts the receiver thread and the dispatcher thread.
    pub fn spawn(self) -> Result<EmulatorHandle> {
        let addr = self.local_addr()?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let (call_tx, call_rx) = unbounded::<(ServiceCall, TcpStream)>();
        let (stop_tx, stop_rx) = unbounded::<()>();

        let receiver = self.receiver;
        let receiver_shutdown = Arc::clone(&shutdown);
        let receiver_thread = thread::spawn(move || {
            if let Err(e) = receiver.receive_loop_with_channel(call_tx, receiver_shutdown) {
                error!("Receiver loop failed: {:?}", e);
            }
        });

        let store = Arc::clone(&self.store);
        let options = self.options;
        let dispatcher_thread = thread::spawn(move || serve(store, options, call_rx, stop_rx));

        info!(
            "Emulator running on {} (page size {}, fail after {:?})",
            addr, self.options.page_size, self.options.fail_after
        );
        Ok(EmulatorHandle {
            addr,
            store: self.store,
            shutdown,
            stop_tx,
            threads: vec![receiver_thread, dispatcher_thread],
        })
    }
}

/// Running emulator; stops when dropped.
pub struct EmulatorHandle {
    addr: SocketAddr,
    store: Arc<Mutex<Store>>,
    shutdown: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    threads: Vec<JoinHandle<()>>,
}

impl EmulatorHandle {
    /// Listening address as `host:port` text, ready for `--endpoint`.
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    /// Shared store, for inspecting what calls changed.
    pub fn store(&self) -> Arc<Mutex<Store>> {
        Arc::clone(&self.store)
    }

    /// Stops both threads and waits for them.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.stop_tx.send(());
        // Unblock the accept call so the receiver sees the flag.
        let _ = TcpStream::connect(self.addr);
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                warn!("Emulator thread panicked");
            }
        }
        info!("Emulator on {} stopped", self.addr);
    }
}

impl Drop for EmulatorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Dispatcher loop: answers calls until a stop signal arrives or the receiver is gone.
pub fn serve(
    store: Arc<Mutex<Store>>,
    options: EmulatorOptions,
    call_rx: Receiver<(ServiceCall, TcpStream)>,
    stop_rx: Receiver<()>,
) {
    let limits = Limits::new(options.page_size);
    let mut faults = FaultPlan::new(options.fail_after);

    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(call_rx) -> msg => match msg {
                Ok((call, stream)) => {
                    let reply = answer(&call, &store, &mut faults, limits);
                    if let ServiceReply::Error { code, .. } = &reply {
                        warn!("{}:{} failed with {}", call.service, call.operation, code);
                    } else {
                        info!("{}:{} answered", call.service, call.operation);
                    }
                    if let Err(e) = write_reply(stream, &reply) {
                        error!("Failed to write reply: {}", e);
                    }
                }
                Err(e) => {
                    error!("Call channel closed: {}", CmdletError::ChannelRecv(e.to_string()));
                    break;
                }
            }
        }
    }
    info!("Dispatcher loop stopping...");
}

/// Runs one call through the fault plan and the service handlers.
pub fn answer(
    call: &ServiceCall,
    store: &Mutex<Store>,
    faults: &mut FaultPlan,
    limits: Limits,
) -> ServiceReply {
    if let Err(fault) = faults.admit() {
        return fault.into();
    }
    let mut store = match store.lock() {
        Ok(store) => store,
        Err(poisoned) => {
            let err = CmdletError::from(poisoned);
            return ServiceReply::error("InternalFailure", err.to_string());
        }
    };
    match dispatch(call, &mut store, limits) {
        Ok(payload) => ServiceReply::Ok { payload },
        Err(fault) => fault.into(),
    }
}

/// Services the emulator answers for.
pub fn services() -> Vec<ServiceId> {
    ServiceId::iter().collect()
}
