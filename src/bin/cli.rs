//! CoolDB CLI Client
//!
//! Command-line interface for a running CoolDB server.

use clap::{Parser, Subcommand};
use cooldb::network::Client;
use tracing_subscriber::{fmt, EnvFilter};

/// CoolDB CLI
#[derive(Parser, Debug)]
#[command(name = "cooldb-cli")]
#[command(about = "CLI for the CoolDB key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all keys
    List,

    /// Show server status
    Status,

    /// Ping the server
    Ping,
}

fn run(args: Args) -> cooldb::Result<i32> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Get { key } => match client.get(&key)? {
            Some(value) => println!("{}", value),
            None => {
                println!("(not found)");
                return Ok(1);
            }
        },
        Commands::Set { key, value } => {
            client.set(&key, &value)?;
            println!("OK");
        }
        Commands::Del { key } => {
            client.delete(&key)?;
            println!("OK");
        }
        Commands::List => {
            let mut keys = client.list()?;
            keys.sort();
            for key in keys {
                println!("{}", key);
            }
        }
        Commands::Status => println!("{}", client.status()?),
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }

    Ok(0)
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    }
}
