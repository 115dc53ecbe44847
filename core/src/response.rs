//! Decomposes a raw response into status, session cookie and JSON payload.
//!
//! Header matching is deliberately literal: the catalog service emits
//! `Content-Length: ` and `Content-Type: ` with that exact casing, and its
//! session cookie is always named [`SESSION_COOKIE`].

use log::debug;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::{Cookie, APPLICATION_JSON, CRLF, HEADER_TERMINATOR};

/// Name of the session cookie issued by the service on login.
pub const SESSION_COOKIE: &str = "connect.sid";

/// Plain-text body the service sends when throttling, even under a JSON
/// content type.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

const CONTENT_LENGTH: &str = "Content-Length: ";
const CONTENT_TYPE: &str = "Content-Type: ";

/// `true` for 2xx status codes.
pub fn is_success(code: u16) -> bool {
    code / 100 == 2
}

/// A parsed HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<String>,
    pub session: Option<Cookie>,
    pub body: String,
    pub json: Option<Value>,
}

impl HttpResponse {
    /// Parse raw response text as returned by the reader.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let (head, body) = match raw.split_once(HEADER_TERMINATOR) {
            Some((head, body)) => (head, body),
            None => (raw.trim_end_matches(CRLF), ""),
        };

        let mut lines = head.split(CRLF);
        let status_line = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ApiError::Protocol("empty response".to_string()))?;
        let status = parse_status(status_line)?;
        let headers: Vec<String> = lines.map(str::to_string).collect();

        let mut session = None;
        let mut has_data = false;
        let mut is_json = false;

        for line in &headers {
            if let Some(value) = session_cookie_value(line) {
                session = Some(Cookie::new(SESSION_COOKIE, value));
            } else if let Some(value) = field(line, CONTENT_LENGTH) {
                has_data = value.trim() != "0";
            } else if let Some(value) = field(line, CONTENT_TYPE) {
                let media_type = value.split(';').next().unwrap_or_default().trim();
                is_json = media_type == APPLICATION_JSON;
            }
        }

        let json = if body == RATE_LIMIT_MESSAGE {
            Some(json!({ "error": RATE_LIMIT_MESSAGE }))
        } else if has_data && is_json && !body.is_empty() {
            let value = serde_json::from_str(body)
                .map_err(|e| ApiError::Deserialization(e.to_string()))?;
            Some(value)
        } else {
            None
        };

        debug!("parsed {status} response, {} body bytes", body.len());

        Ok(Self {
            status,
            headers,
            session,
            body: body.to_string(),
            json,
        })
    }

    pub fn is_success(&self) -> bool {
        is_success(self.status)
    }

    /// The `token` field of a JSON body, as handed out by library access.
    pub fn token(&self) -> Option<&str> {
        self.json.as_ref()?.get("token")?.as_str()
    }

    /// The `error` field of a JSON body, or the whole document if it has none.
    pub fn error_message(&self) -> Option<String> {
        let json = self.json.as_ref()?;
        match json.get("error") {
            Some(Value::String(message)) => Some(message.clone()),
            _ => Some(json.to_string()),
        }
    }

    /// Fail with [`ApiError::HttpError`] unless the status is 2xx.
    pub fn check_status(&self) -> Result<(), ApiError> {
        if self.is_success() {
            return Ok(());
        }
        Err(ApiError::HttpError {
            status: self.status,
            message: self.error_message(),
        })
    }
}

fn parse_status(line: &str) -> Result<u16, ApiError> {
    line.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| ApiError::Protocol(format!("bad status line: {line:?}")))
}

/// Value after a literal `Name: ` prefix anywhere in the line.
fn field<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.find(prefix).map(|pos| &line[pos + prefix.len()..])
}

/// The session cookie value up to the next `;`, if the line carries one.
fn session_cookie_value(line: &str) -> Option<&str> {
    let marker = format!("{SESSION_COOKIE}=");
    let rest = field(line, &marker)?;
    Some(rest.split(';').next().unwrap_or_default())
}
