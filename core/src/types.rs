//! Request payloads for the catalog API.
//!
//! # Design
//! The service takes every body field as a string, so these types flatten
//! into ordered `KeyValue` pairs rather than deriving `Serialize`. Field
//! order on the wire follows the order of the pairs.

use crate::http::KeyValue;

/// Username and password for register and login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn to_pairs(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("username", &self.username),
            KeyValue::new("password", &self.password),
        ]
    }
}

/// A book to add to the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    pub page_count: u32,
}

impl NewBook {
    pub fn to_pairs(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("title", &self.title),
            KeyValue::new("author", &self.author),
            KeyValue::new("genre", &self.genre),
            KeyValue::new("page_count", self.page_count.to_string()),
            KeyValue::new("publisher", &self.publisher),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_pairs_are_strings_in_order() {
        let book = NewBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "SF".to_string(),
            publisher: "Chilton".to_string(),
            page_count: 412,
        };
        let keys: Vec<_> = book.to_pairs().into_iter().map(|kv| kv.key).collect();
        assert_eq!(keys, ["title", "author", "genre", "page_count", "publisher"]);
        assert_eq!(book.to_pairs()[3].value, "412");
    }

    #[test]
    fn credential_pairs() {
        let pairs = Credentials::new("ana", "secret").to_pairs();
        assert_eq!(pairs[0], KeyValue::new("username", "ana"));
        assert_eq!(pairs[1], KeyValue::new("password", "secret"));
    }
}
