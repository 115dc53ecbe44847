//! Client core for the library catalog REST service.
//!
//! # Overview
//! Speaks HTTP/1.1 over a raw TCP socket: requests are rendered by hand,
//! responses are reassembled from the byte stream and parsed for status,
//! session cookie and JSON payload.
//!
//! # Design
//! - `http` renders requests, `reader` reassembles responses, `response`
//!   parses them. None of these touch a socket.
//! - `transport` owns the socket; one connection per exchange.
//! - `client` is stateless: `build_*` produces an `HttpRequest` from the
//!   session, `parse_*` consumes an `HttpResponse` and updates the session.
//! - `driver` strings the pieces together over any `Transport`, so tests can
//!   swap the network for a recording double.

pub mod client;
pub mod driver;
pub mod error;
pub mod http;
pub mod reader;
pub mod response;
pub mod session;
pub mod transport;
pub mod types;

pub use client::LibraryClient;
pub use driver::Driver;
pub use error::ApiError;
pub use http::{Cookie, HttpMethod, HttpRequest, KeyValue};
pub use response::{is_success, HttpResponse};
pub use session::ClientSession;
pub use transport::{TcpTransport, Transport};
pub use types::{Credentials, NewBook};
