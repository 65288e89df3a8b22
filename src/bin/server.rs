//! CoolDB Server Binary
//!
//! Serves a database file over TCP.

use std::io;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use cooldb::network::Server;
use cooldb::{Config, Store, WalSyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// CoolDB Server
#[derive(Parser, Debug)]
#[command(name = "cooldb-server")]
#[command(about = "Serve a CoolDB database over TCP")]
#[command(version)]
struct Args {
    /// Database file path
    #[arg(short = 'a', long = "db", default_value = "cooldb.cdb")]
    db: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    listen: String,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// Maximum queued connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Only flush commits to the OS instead of fsyncing them
    #[arg(long)]
    no_fsync: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cooldb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("CoolDB Server v{}", cooldb::VERSION);
    tracing::info!("Database file: {}", args.db);
    tracing::info!("Listen address: {}", args.listen);

    let strategy = if args.no_fsync {
        WalSyncStrategy::OsBuffer
    } else {
        WalSyncStrategy::EveryCommit
    };

    // Build config from args
    let config = Config::builder()
        .db_path(&args.db)
        .wal_sync_strategy(strategy)
        .listen_addr(&args.listen)
        .worker_threads(args.workers)
        .max_connections(args.max_connections)
        .build();

    // Open store
    let store = match Store::open(config.clone()) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let recovery = store.last_recovery();
    tracing::info!(
        keys = store.len(),
        recovered = recovery.records_recovered,
        skipped = recovery.records_skipped,
        "Store initialized successfully"
    );

    let mut server = match Server::bind(config, Arc::clone(&store)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Type `quit` on stdin to stop; a closed stdin keeps serving
    let handle = server.shutdown_handle();
    let watcher = thread::Builder::new()
        .name("cooldb-stdin".to_string())
        .spawn(move || handle.stop_on_quit(io::stdin().lock()));
    if let Err(e) = watcher {
        tracing::warn!(error = %e, "stdin watcher unavailable, stop the process to exit");
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    drop(server);
    match Arc::try_unwrap(store) {
        Ok(store) => {
            if let Err(e) = store.close() {
                tracing::error!("Failed to close store: {}", e);
                std::process::exit(1);
            }
        }
        Err(_) => tracing::warn!("store still shared at exit, skipping close"),
    }

    tracing::info!("Server stopped");
}
