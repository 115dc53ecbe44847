//! Runs catalog operations end to end.
//!
//! Each method builds the request (checking session preconditions first),
//! hands the wire bytes to the transport, parses the raw response and lets
//! the client apply session changes. A precondition failure returns before
//! the transport is touched.

use log::debug;
use serde_json::Value;

use crate::client::LibraryClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::response::HttpResponse;
use crate::session::ClientSession;
use crate::transport::Transport;
use crate::types::{Credentials, NewBook};

pub struct Driver<T> {
    client: LibraryClient,
    transport: T,
    session: ClientSession,
}

impl<T: Transport> Driver<T> {
    pub fn new(client: LibraryClient, transport: T) -> Self {
        Self {
            client,
            transport,
            session: ClientSession::new(),
        }
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!("{} HTTP/1.1", request.target());
        let wire = request.to_wire()?;
        let raw = self.transport.exchange(&wire)?;
        HttpResponse::parse(&raw)
    }

    pub fn register(&mut self, credentials: &Credentials) -> Result<(), ApiError> {
        let request = self.client.build_register(credentials);
        let response = self.send(request)?;
        self.client.parse_register(response)
    }

    pub fn login(&mut self, credentials: &Credentials) -> Result<(), ApiError> {
        let request = self.client.build_login(credentials);
        let response = self.send(request)?;
        self.client.parse_login(&mut self.session, response)
    }

    pub fn logout(&mut self) -> Result<(), ApiError> {
        let request = self.client.build_logout(&self.session)?;
        let response = self.send(request)?;
        self.client.parse_logout(&mut self.session, response)
    }

    pub fn enter_library(&mut self) -> Result<(), ApiError> {
        let request = self.client.build_enter_library(&self.session)?;
        let response = self.send(request)?;
        self.client.parse_enter_library(&mut self.session, response)
    }

    pub fn get_books(&mut self) -> Result<Value, ApiError> {
        let request = self.client.build_get_books(&self.session)?;
        let response = self.send(request)?;
        self.client.parse_get_books(response)
    }

    pub fn get_book(&mut self, id: u32) -> Result<Value, ApiError> {
        let request = self.client.build_get_book(&self.session, id)?;
        let response = self.send(request)?;
        self.client.parse_get_book(response)
    }

    pub fn add_book(&mut self, book: &NewBook) -> Result<(), ApiError> {
        let request = self.client.build_add_book(&self.session, book)?;
        let response = self.send(request)?;
        self.client.parse_add_book(response)
    }

    pub fn delete_book(&mut self, id: u32) -> Result<(), ApiError> {
        let request = self.client.build_delete_book(&self.session, id)?;
        let response = self.send(request)?;
        self.client.parse_delete_book(response)
    }
}
