//! Interactive client for the library catalog service.
//!
//! ```text
//! client <HOST> <PORT>
//! ```
//!
//! Commands are read from standard input one per line: `register`, `login`,
//! `enter_library`, `get_books`, `get_book`, `add_book`, `delete_book`,
//! `logout` and `exit`. Set `RUST_LOG=debug` to trace each exchange.

mod input;
mod repl;

use std::io;

use anyhow::Context;
use clap::Parser;
use library_core::{ApiError, Driver, LibraryClient, TcpTransport};
use log::info;

use crate::repl::Shell;

#[derive(Debug, Parser)]
#[command(name = "client", about = "Interactive client for the library catalog service")]
struct Args {
    /// Service host name or IPv4 address
    host: String,

    /// Service TCP port
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut transport = TcpTransport::new(&args.host, args.port)
        .with_context(|| format!("invalid service address {}:{}", args.host, args.port))?;
    transport
        .probe()
        .with_context(|| format!("service at {}:{} is unreachable", args.host, args.port))?;
    info!("service reachable at {}", transport.addr());

    let driver = Driver::new(LibraryClient::new(&args.host), transport);
    let stdin = io::stdin();
    let mut shell = Shell::new(stdin.lock(), io::stdout(), io::stderr(), driver);
    shell.run().map_err(|e| {
        let context = exit_context(&e);
        anyhow::Error::new(e).context(context)
    })
}

/// Fatal errors come from the network; anything else ending the loop is a
/// failure on the terminal streams.
fn exit_context(error: &ApiError) -> &'static str {
    if error.is_fatal() {
        "lost the connection to the service"
    } else {
        "terminal I/O failed"
    }
}
