//! CoolDB Interactive Shell
//!
//! Line-oriented REPL over a local database file.

use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use clap::Parser;
use cooldb::{Config, Result, Store, TxId, WalSyncStrategy, NO_TRANSACTION};
use tracing_subscriber::{fmt, EnvFilter};

/// CoolDB shell
#[derive(Parser, Debug)]
#[command(name = "cooldb-shell")]
#[command(about = "Interactive terminal for a CoolDB database file")]
#[command(version)]
struct Args {
    /// Database file path
    #[arg(short = 'a', long = "db", default_value = "cooldb.cdb")]
    db: String,

    /// Only flush commits to the OS instead of fsyncing them
    #[arg(long)]
    no_fsync: bool,
}

const HELP: &str = "\
Available commands:
  begin                   - Start a new transaction
  set <key> <value>       - Set a key-value pair
  get <key>               - Retrieve a value
  delete <key>            - Delete a key
  list                    - List committed keys
  commit                  - Commit the current transaction
  rollback                - Rollback the current transaction
  exit                    - Exit the terminal";

struct Shell {
    store: Store,
    current_tx: TxId,
}

enum Flow {
    Continue,
    Exit,
}

impl Shell {
    fn execute(&mut self, line: &str) -> Flow {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            return Flow::Continue;
        };

        match command {
            "begin" => {
                if self.current_tx != NO_TRANSACTION {
                    println!("Transaction {} is still active; commit or rollback first", self.current_tx);
                    return Flow::Continue;
                }
                match self.store.begin() {
                    Ok(txid) => {
                        self.current_tx = txid;
                        println!("Started transaction {}", txid);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }

            "set" => {
                if parts.len() < 3 {
                    println!("Usage: set <key> <value>");
                } else if self.require_tx() {
                    let (key, value) = (parts[1], parts[2]);
                    let (elapsed, result) = timed(|| self.store.set(self.current_tx, key, value));
                    match result {
                        Ok(()) => println!(
                            "Set {} = {} in transaction {} (took {})",
                            key, value, self.current_tx, ms(elapsed)
                        ),
                        Err(e) => println!("Error: {}", e),
                    }
                }
            }

            "get" => {
                if parts.len() < 2 {
                    println!("Usage: get <key>");
                } else {
                    let key = parts[1];
                    let (elapsed, value) = timed(|| self.store.get(key));
                    match value {
                        Some(value) => println!("{} = {} (took {})", key, value, ms(elapsed)),
                        None => println!("Key {} not found (took {})", key, ms(elapsed)),
                    }
                }
            }

            "delete" => {
                if parts.len() < 2 {
                    println!("Usage: delete <key>");
                } else if self.require_tx() {
                    let key = parts[1];
                    let (elapsed, result) = timed(|| self.store.delete(self.current_tx, key));
                    match result {
                        Ok(()) => println!(
                            "Deleted {} in transaction {} (took {})",
                            key, self.current_tx, ms(elapsed)
                        ),
                        Err(e) => println!("Error: {}", e),
                    }
                }
            }

            "list" => {
                let mut keys = self.store.list();
                keys.sort();
                println!("Keys ({}):", keys.len());
                for key in keys {
                    println!("  {}", key);
                }
            }

            "commit" => {
                if self.current_tx == NO_TRANSACTION {
                    println!("No active transaction to commit");
                    return Flow::Continue;
                }
                let txid = self.current_tx;
                let (elapsed, result) = timed(|| self.store.commit(txid));
                // A failed commit discards the transaction as well
                self.current_tx = NO_TRANSACTION;
                match result {
                    Ok(()) => println!("Transaction {} committed (took {})", txid, ms(elapsed)),
                    Err(e) => println!("Commit error: {}", e),
                }
            }

            "rollback" => {
                if self.current_tx == NO_TRANSACTION {
                    println!("No active transaction to rollback");
                    return Flow::Continue;
                }
                let txid = self.current_tx;
                let (elapsed, result) = timed(|| self.store.rollback(txid));
                self.current_tx = NO_TRANSACTION;
                match result {
                    Ok(()) => println!("Transaction {} rolled back (took {})", txid, ms(elapsed)),
                    Err(e) => println!("Rollback error: {}", e),
                }
            }

            "help" => println!("{}", HELP),

            "exit" | "quit" => {
                println!("Exiting CoolDB...");
                return Flow::Exit;
            }

            _ => println!("Unknown command. Type 'help' for a list."),
        }

        Flow::Continue
    }

    fn require_tx(&self) -> bool {
        if self.current_tx == NO_TRANSACTION {
            println!("No active transaction. Use 'begin' first.");
            return false;
        }
        true
    }
}

fn timed<T>(f: impl FnOnce() -> T) -> (Duration, T) {
    let start = Instant::now();
    let out = f();
    (start.elapsed(), out)
}

fn ms(elapsed: Duration) -> String {
    format!("{:.3} ms", elapsed.as_secs_f64() * 1000.0)
}

fn main() -> Result<()> {
    // stdout belongs to the user; logs go to stderr and stay quiet by default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();

    let strategy = if args.no_fsync {
        WalSyncStrategy::OsBuffer
    } else {
        WalSyncStrategy::EveryCommit
    };
    let config = Config::builder()
        .db_path(&args.db)
        .wal_sync_strategy(strategy)
        .build();

    let store = match Store::open(config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            std::process::exit(1);
        }
    };

    let mut shell = Shell {
        store,
        current_tx: NO_TRANSACTION,
    };

    println!("CoolDB Interactive Terminal v{}", cooldb::VERSION);
    println!("{}", HELP);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("cooldb> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };

        if let Flow::Exit = shell.execute(line?.trim()) {
            break;
        }
    }

    shell.store.close()
}
