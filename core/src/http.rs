//! HTTP/1.1 request model and wire encoding.
//!
//! # Design
//! `HttpRequest` describes a request as plain data: method, path, optional
//! query string, body pairs, cookies and bearer token. Nothing touches the
//! network here; [`HttpRequest::to_wire`] renders the exact bytes that the
//! transport writes to the socket.
//!
//! Header policy: `Host` is always emitted. `Authorization` and `Cookie` are
//! emitted only when there is something to put in them, never as empty
//! values. POST requests always carry `Content-Type` and a `Content-Length`
//! computed from the serialized body.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::ApiError;

/// Line terminator used on the wire.
pub const CRLF: &str = "\r\n";

/// Separator between the header block and the body.
pub const HEADER_TERMINATOR: &str = "\r\n\r\n";

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cookie.
///
/// The default value, with both fields empty, is the "no session" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub key: String,
    pub value: String,
}

impl Cookie {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.key.is_empty() && self.value.is_empty()
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// One body parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built with [`HttpRequest::get`], [`HttpRequest::post`] or
/// [`HttpRequest::delete`] and refined with the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub host: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<KeyValue>,
    pub cookies: Vec<Cookie>,
    pub token: Option<String>,
}

impl HttpRequest {
    fn new(method: HttpMethod, host: &str, path: &str) -> Self {
        Self {
            method,
            host: host.to_string(),
            path: path.to_string(),
            query: None,
            content_type: None,
            body: Vec::new(),
            cookies: Vec::new(),
            token: None,
        }
    }

    pub fn get(host: &str, path: &str) -> Self {
        Self::new(HttpMethod::Get, host, path)
    }

    pub fn delete(host: &str, path: &str) -> Self {
        Self::new(HttpMethod::Delete, host, path)
    }

    pub fn post(host: &str, path: &str, content_type: &str, body: Vec<KeyValue>) -> Self {
        Self {
            content_type: Some(content_type.to_string()),
            body,
            ..Self::new(HttpMethod::Post, host, path)
        }
    }

    /// Query string appended after `?`. An empty string means no query.
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = (!query.is_empty()).then(|| query.to_string());
        self
    }

    pub fn with_cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Bearer token for the `Authorization` header. An empty string means
    /// no header.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = (!token.is_empty()).then(|| token.to_string());
        self
    }

    /// The request line without the protocol version, e.g. `GET /books`.
    pub fn target(&self) -> String {
        match &self.query {
            Some(q) => format!("{} {}?{q}", self.method, self.path),
            None => format!("{} {}", self.method, self.path),
        }
    }

    /// Serialize the body pairs according to the content type: a JSON
    /// object for `application/json`, `k=v&k=v` otherwise.
    ///
    /// Returns `None` for methods that carry no body.
    pub fn encode_body(&self) -> Result<Option<String>, ApiError> {
        let Some(content_type) = self.content_type.as_deref() else {
            return Ok(None);
        };
        if content_type == APPLICATION_JSON {
            let object: Map<String, Value> = self
                .body
                .iter()
                .map(|kv| (kv.key.clone(), Value::String(kv.value.clone())))
                .collect();
            let encoded = serde_json::to_string(&Value::Object(object))
                .map_err(|e| ApiError::Serialization(e.to_string()))?;
            Ok(Some(encoded))
        } else {
            let encoded = self
                .body
                .iter()
                .map(|kv| format!("{}={}", kv.key, kv.value))
                .collect::<Vec<_>>()
                .join("&");
            Ok(Some(encoded))
        }
    }

    /// Render the exact bytes sent on the wire.
    pub fn to_wire(&self) -> Result<Vec<u8>, ApiError> {
        let mut out = String::new();
        out.push_str(&self.target());
        out.push_str(" HTTP/1.1");
        out.push_str(CRLF);

        push_header(&mut out, "Host", &self.host);

        if let Some(token) = &self.token {
            push_header(&mut out, "Authorization", &format!("Bearer {token}"));
        }

        let body = self.encode_body()?;
        if let Some(content_type) = &self.content_type {
            push_header(&mut out, "Content-Type", content_type);
        }

        if !self.cookies.is_empty() {
            let joined = self
                .cookies
                .iter()
                .map(Cookie::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            push_header(&mut out, "Cookie", &joined);
        }

        if let Some(body) = &body {
            push_header(&mut out, "Content-Length", &body.len().to_string());
        }

        out.push_str(CRLF);

        if let Some(body) = body {
            out.push_str(&body);
            out.push_str(CRLF);
        }

        Ok(out.into_bytes())
    }
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str(CRLF);
}

/// Build a GET request.
pub fn build_get(
    host: &str,
    path: &str,
    query: &str,
    cookies: &[Cookie],
    token: &str,
) -> Result<Vec<u8>, ApiError> {
    HttpRequest::get(host, path)
        .with_query(query)
        .with_cookies(cookies.to_vec())
        .with_token(token)
        .to_wire()
}

/// Build a DELETE request.
pub fn build_delete(
    host: &str,
    path: &str,
    cookies: &[Cookie],
    token: &str,
) -> Result<Vec<u8>, ApiError> {
    HttpRequest::delete(host, path)
        .with_cookies(cookies.to_vec())
        .with_token(token)
        .to_wire()
}

/// Build a POST request whose body is encoded per `content_type`.
pub fn build_post(
    host: &str,
    path: &str,
    content_type: &str,
    body: &[KeyValue],
    cookies: &[Cookie],
    token: &str,
) -> Result<Vec<u8>, ApiError> {
    HttpRequest::post(host, path, content_type, body.to_vec())
        .with_cookies(cookies.to_vec())
        .with_token(token)
        .to_wire()
}
