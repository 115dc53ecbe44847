use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 3000;

/// Port from the `PORT` variable, or the default when unset.
fn listen_port(var: Option<String>) -> io::Result<u16> {
    match var {
        None => Ok(DEFAULT_PORT),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid PORT {raw:?}"))),
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let port = listen_port(std::env::var("PORT").ok())?;
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await?;
    println!("library service listening on {}", listener.local_addr()?);
    mock_server::run(listener).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_and_rejects_garbage() {
        assert_eq!(listen_port(None).unwrap(), DEFAULT_PORT);
        assert_eq!(listen_port(Some("8080".to_string())).unwrap(), 8080);
        assert!(listen_port(Some("http".to_string())).is_err());
    }
}
