use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use hyper::server::conn::http1;
use hyper_util::{rt::TokioIo, service::TowerToHyperService};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "connect.sid";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: u32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    pub page_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookSummary {
    pub id: u32,
    pub title: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Book fields as the client sends them: every value is a string.
#[derive(Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    pub page_count: String,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, String>,
    sessions: HashMap<String, String>,
    tokens: HashMap<String, String>,
    books: BTreeMap<u32, Book>,
    next_id: u32,
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

fn fail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/v1/tema/auth/register", post(register))
        .route("/api/v1/tema/auth/login", post(login))
        .route("/api/v1/tema/auth/logout", get(logout))
        .route("/api/v1/tema/library/access", get(library_access))
        .route("/api/v1/tema/library/books", get(list_books).post(add_book))
        .route("/api/v1/tema/library/books/{id}", get(get_book).delete(delete_book))
        .with_state(db)
}

/// Serve `app()` on `listener`, one hyper HTTP/1 connection per accepted
/// socket. Header names go out in Title-Case, as the real service sends them.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    let app = app();
    loop {
        let (stream, _) = listener.accept().await?;
        let service = TowerToHyperService::new(app.clone());
        tokio::spawn(async move {
            let _ = http1::Builder::new()
                .title_case_headers(true)
                .serve_connection(TokioIo::new(stream), service)
                .await;
        });
    }
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{SESSION_COOKIE}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| pair.trim().strip_prefix(prefix.as_str()).map(str::to_string))
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// Resolve the logged-in user from the session cookie.
fn require_session(store: &Store, headers: &HeaderMap) -> ApiResult<String> {
    let sid = session_id(headers).ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "You are not logged in!"))?;
    store
        .sessions
        .get(&sid)
        .cloned()
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "You are not logged in!"))
}

/// Check both the session cookie and a library token issued to that user.
fn require_library(store: &Store, headers: &HeaderMap) -> ApiResult<()> {
    let user = require_session(store, headers)?;
    let token = bearer(headers).ok_or_else(|| fail(StatusCode::FORBIDDEN, "Authorization header is missing!"))?;
    match store.tokens.get(&token) {
        Some(owner) if *owner == user => Ok(()),
        _ => Err(fail(StatusCode::FORBIDDEN, "Error when decoding token!")),
    }
}

async fn register(State(db): State<Db>, Json(input): Json<Credentials>) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    if store.users.contains_key(&input.username) {
        let message = format!("The username {} is taken!", input.username);
        return Err(fail(StatusCode::BAD_REQUEST, &message));
    }
    store.users.insert(input.username, input.password);
    Ok((StatusCode::CREATED, Json(json!({ "message": "Created" }))))
}

async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> ApiResult<Response> {
    let mut store = db.write().await;
    match store.users.get(&input.username) {
        Some(password) if *password == input.password => {}
        _ => return Err(fail(StatusCode::BAD_REQUEST, "Credentials are not good!")),
    }
    let sid = Uuid::new_v4().to_string();
    store.sessions.insert(sid.clone(), input.username);
    let cookie = format!("{SESSION_COOKIE}={sid}; Path=/; HttpOnly");
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "message": "OK" }))).into_response())
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    require_session(&store, &headers)?;
    if let Some(sid) = session_id(&headers) {
        store.sessions.remove(&sid);
    }
    Ok(Json(json!({ "message": "OK" })))
}

async fn library_access(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let user = require_session(&store, &headers)?;
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone(), user);
    Ok(Json(json!({ "token": token })))
}

async fn list_books(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Vec<BookSummary>>> {
    let store = db.read().await;
    require_library(&store, &headers)?;
    let books = store
        .books
        .values()
        .map(|b| BookSummary {
            id: b.id,
            title: b.title.clone(),
        })
        .collect();
    Ok(Json(books))
}

async fn add_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewBook>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    require_library(&store, &headers)?;

    let page_count = input.page_count.parse::<u32>().ok().filter(|n| *n > 0);
    let fields = [&input.title, &input.author, &input.genre, &input.publisher];
    let (Some(page_count), true) = (page_count, fields.iter().all(|f| !f.is_empty())) else {
        return Err(fail(StatusCode::BAD_REQUEST, "Something Bad Happened"));
    };

    store.next_id += 1;
    let book = Book {
        id: store.next_id,
        title: input.title,
        author: input.author,
        genre: input.genre,
        publisher: input.publisher,
        page_count,
    };
    store.books.insert(book.id, book);
    Ok(Json(json!({ "message": "OK" })))
}

async fn get_book(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u32>) -> ApiResult<Json<Book>> {
    let store = db.read().await;
    require_library(&store, &headers)?;
    store
        .books
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "No book was found!"))
}

async fn delete_book(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u32>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    require_library(&store, &headers)?;
    store
        .books
        .remove(&id)
        .map(|_| Json(json!({ "message": "OK" })))
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "No book was found!"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn book_serializes_to_json() {
        let book = Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "SF".to_string(),
            publisher: "Chilton".to_string(),
            page_count: 412,
        };
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["page_count"], 412);
        assert_eq!(json["publisher"], "Chilton");
    }

    #[test]
    fn new_book_takes_string_page_count() {
        let input: NewBook = serde_json::from_str(
            r#"{"title":"T","author":"A","genre":"G","page_count":"12","publisher":"P"}"#,
        )
        .unwrap();
        assert_eq!(input.page_count, "12");
    }

    #[test]
    fn new_book_rejects_missing_field() {
        let result: Result<NewBook, _> =
            serde_json::from_str(r#"{"title":"T","author":"A","genre":"G","page_count":"12"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn session_id_found_among_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; connect.sid=abc"));
        assert_eq!(session_id(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn bearer_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert!(bearer(&headers).is_none());
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(bearer(&headers).as_deref(), Some("xyz"));
    }
}
