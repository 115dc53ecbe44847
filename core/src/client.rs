//! Request builder and response parser for the library catalog API.
//!
//! # Design
//! `LibraryClient` holds only the host name sent in `Host` headers. Each
//! operation is split into a `build_*` method that checks session
//! preconditions and produces an `HttpRequest`, and a `parse_*` method that
//! consumes the `HttpResponse` and applies any session change. Precondition
//! failures surface from `build_*`, so no request exists to send.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpRequest, APPLICATION_JSON};
use crate::response::HttpResponse;
use crate::session::ClientSession;
use crate::types::{Credentials, NewBook};

pub const REGISTER_PATH: &str = "/api/v1/tema/auth/register";
pub const LOGIN_PATH: &str = "/api/v1/tema/auth/login";
pub const LOGOUT_PATH: &str = "/api/v1/tema/auth/logout";
pub const ACCESS_PATH: &str = "/api/v1/tema/library/access";
pub const BOOKS_PATH: &str = "/api/v1/tema/library/books";

/// Stateless client for the catalog API.
#[derive(Debug, Clone)]
pub struct LibraryClient {
    host: String,
}

impl LibraryClient {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
        }
    }

    pub fn build_register(&self, credentials: &Credentials) -> HttpRequest {
        HttpRequest::post(&self.host, REGISTER_PATH, APPLICATION_JSON, credentials.to_pairs())
    }

    pub fn build_login(&self, credentials: &Credentials) -> HttpRequest {
        HttpRequest::post(&self.host, LOGIN_PATH, APPLICATION_JSON, credentials.to_pairs())
    }

    pub fn build_logout(&self, session: &ClientSession) -> Result<HttpRequest, ApiError> {
        let cookie = session.require_login()?;
        Ok(HttpRequest::get(&self.host, LOGOUT_PATH).with_cookies(vec![cookie.clone()]))
    }

    pub fn build_enter_library(&self, session: &ClientSession) -> Result<HttpRequest, ApiError> {
        let cookie = session.require_login()?;
        Ok(HttpRequest::get(&self.host, ACCESS_PATH).with_cookies(vec![cookie.clone()]))
    }

    pub fn build_get_books(&self, session: &ClientSession) -> Result<HttpRequest, ApiError> {
        let (cookie, token) = session.require_library()?;
        Ok(HttpRequest::get(&self.host, BOOKS_PATH)
            .with_cookies(vec![cookie.clone()])
            .with_token(token))
    }

    pub fn build_get_book(&self, session: &ClientSession, id: u32) -> Result<HttpRequest, ApiError> {
        let (cookie, token) = session.require_library()?;
        Ok(HttpRequest::get(&self.host, &book_path(id))
            .with_cookies(vec![cookie.clone()])
            .with_token(token))
    }

    pub fn build_add_book(&self, session: &ClientSession, book: &NewBook) -> Result<HttpRequest, ApiError> {
        let (cookie, token) = session.require_library()?;
        Ok(HttpRequest::post(&self.host, BOOKS_PATH, APPLICATION_JSON, book.to_pairs())
            .with_cookies(vec![cookie.clone()])
            .with_token(token))
    }

    pub fn build_delete_book(&self, session: &ClientSession, id: u32) -> Result<HttpRequest, ApiError> {
        let (cookie, token) = session.require_library()?;
        Ok(HttpRequest::delete(&self.host, &book_path(id))
            .with_cookies(vec![cookie.clone()])
            .with_token(token))
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<(), ApiError> {
        response.check_status()
    }

    /// Replaces the session cookie with the one from a successful login. A
    /// success without a cookie leaves the session logged out.
    pub fn parse_login(&self, session: &mut ClientSession, response: HttpResponse) -> Result<(), ApiError> {
        response.check_status()?;
        session.set_cookie(response.session.unwrap_or_default());
        Ok(())
    }

    /// Clears the session cookie on success.
    pub fn parse_logout(&self, session: &mut ClientSession, response: HttpResponse) -> Result<(), ApiError> {
        response.check_status()?;
        session.clear_cookie();
        Ok(())
    }

    /// Stores the library token from a successful access response.
    pub fn parse_enter_library(
        &self,
        session: &mut ClientSession,
        response: HttpResponse,
    ) -> Result<(), ApiError> {
        response.check_status()?;
        let token = response.token().ok_or(ApiError::MissingToken)?;
        session.set_library_token(token);
        Ok(())
    }

    pub fn parse_get_books(&self, response: HttpResponse) -> Result<Value, ApiError> {
        response.check_status()?;
        Ok(response.json.unwrap_or(Value::Array(Vec::new())))
    }

    pub fn parse_get_book(&self, response: HttpResponse) -> Result<Value, ApiError> {
        response.check_status()?;
        Ok(response.json.unwrap_or(Value::Null))
    }

    pub fn parse_add_book(&self, response: HttpResponse) -> Result<(), ApiError> {
        response.check_status()
    }

    pub fn parse_delete_book(&self, response: HttpResponse) -> Result<(), ApiError> {
        response.check_status()
    }
}

fn book_path(id: u32) -> String {
    format!("{BOOKS_PATH}/{id}")
}
