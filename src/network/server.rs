//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::{BufRead, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};

use crate::autocommit::AutoCommit;
use crate::config::Config;
use crate::error::{CoolDbError, Result};
use crate::store::Store;
use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for CoolDB
pub struct Server {
    config: Config,
    db: AutoCommit,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

/// Cloneable handle that stops a running [`Server`]
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the accept loop to stop
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Block reading lines from `input`; a `quit`, `exit` or `stop` line
    /// triggers shutdown
    ///
    /// Returns whether shutdown was triggered. End of input or a read error
    /// leaves the server running.
    pub fn stop_on_quit<R: BufRead>(&self, input: R) -> bool {
        for line in input.lines() {
            match line {
                Ok(line) if matches!(line.trim(), "quit" | "exit" | "stop") => {
                    tracing::info!("shutdown requested");
                    self.shutdown();
                    return true;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "stopped reading shutdown input");
                    return false;
                }
            }
        }
        false
    }
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, store: Arc<Store>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            CoolDbError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        // Non-blocking accept so the loop can observe shutdown
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            db: AutoCommit::new(store),
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Start the server (blocking)
    ///
    /// Accepted connections are queued on a bounded channel of
    /// `max_connections` slots and served by `worker_threads` workers. When
    /// the queue is full new connections are dropped. Returns after
    /// [`Server::shutdown`] once every worker has finished its connection.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(
            addr = %self.local_addr()?,
            workers = self.config.worker_threads,
            "server listening"
        );

        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections);
        let workers: Vec<JoinHandle<()>> = (0..self.config.worker_threads)
            .map(|id| self.spawn_worker(id, rx.clone()))
            .collect::<std::io::Result<_>>()?;
        drop(rx);

        let result = loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break Ok(());
            }

            match self.listener.accept() {
                Ok((stream, peer)) => match tx.try_send(stream) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(%peer, "connection queue full, dropping connection");
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        break Err(CoolDbError::Network("all workers exited".to_string()));
                    }
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        };

        // Closing the channel lets idle workers exit
        drop(tx);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }

        tracing::info!("server stopped");
        result
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn spawn_worker(&self, id: usize, rx: Receiver<TcpStream>) -> std::io::Result<JoinHandle<()>> {
        let db = self.db.clone();
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        thread::Builder::new()
            .name(format!("cooldb-worker-{}", id))
            .spawn(move || {
                for stream in rx.iter() {
                    if let Err(e) = serve(stream, db.clone(), read_ms, write_ms) {
                        tracing::debug!(worker = id, error = %e, "connection ended with error");
                    }
                }
            })
    }
}

fn serve(stream: TcpStream, db: AutoCommit, read_ms: u64, write_ms: u64) -> Result<()> {
    // Accepted sockets may inherit the listener's non-blocking mode
    stream.set_nonblocking(false)?;
    let mut connection = Connection::new(stream, db)?;
    connection.set_timeouts(read_ms, write_ms)?;
    connection.handle()
}
