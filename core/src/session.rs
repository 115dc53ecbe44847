//! Credentials held between commands.

use crate::error::ApiError;
use crate::http::Cookie;

/// Session cookie and library token for the current user.
///
/// Login sets the cookie, entering the library sets the token and logout
/// clears the cookie. Nothing else mutates it.
#[derive(Debug, Clone, Default)]
pub struct ClientSession {
    cookie: Option<Cookie>,
    library_token: Option<String>,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session cookie, or the empty sentinel when logged out.
    pub fn cookie(&self) -> Cookie {
        self.cookie.clone().unwrap_or_default()
    }

    /// The library token, or an empty string if the library was not entered.
    pub fn library_token(&self) -> &str {
        self.library_token.as_deref().unwrap_or_default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.cookie.is_some()
    }

    pub fn has_library_access(&self) -> bool {
        self.library_token.is_some()
    }

    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookie = (!cookie.is_null()).then_some(cookie);
    }

    pub fn clear_cookie(&mut self) {
        self.cookie = None;
    }

    pub fn set_library_token(&mut self, token: &str) {
        self.library_token = (!token.is_empty()).then(|| token.to_string());
    }

    /// The cookie to send on authenticated requests.
    pub fn require_login(&self) -> Result<&Cookie, ApiError> {
        self.cookie.as_ref().ok_or(ApiError::NotLoggedIn)
    }

    /// Cookie and bearer token for library requests. Login is checked first.
    pub fn require_library(&self) -> Result<(&Cookie, &str), ApiError> {
        let cookie = self.require_login()?;
        let token = self
            .library_token
            .as_deref()
            .ok_or(ApiError::NotInLibrary)?;
        Ok((cookie, token))
    }
}
