//! Full session lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every catalog
//! operation over real TCP through `TcpTransport`, so request rendering,
//! response reassembly and parsing are all exercised against a real peer.

use library_core::{ApiError, Credentials, Driver, LibraryClient, NewBook, TcpTransport};

fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn driver(addr: std::net::SocketAddr) -> Driver<TcpTransport> {
    let host = addr.ip().to_string();
    let mut transport = TcpTransport::new(&host, addr.port()).unwrap();
    transport.probe().unwrap();
    Driver::new(LibraryClient::new(&host), transport)
}

#[test]
fn session_lifecycle() {
    let addr = start_server();
    let mut d = driver(addr);
    let creds = Credentials::new("reader", "hunter2");

    // Step 1: library commands before login never reach the server.
    assert!(matches!(d.get_books(), Err(ApiError::NotLoggedIn)));

    // Step 2: register, then registering again is rejected.
    d.register(&creds).unwrap();
    let err = d.register(&creds).unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 400, .. }));

    // Step 3: wrong password.
    let err = d.login(&Credentials::new("reader", "nope")).unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 400, .. }));
    assert!(!d.session().is_logged_in());

    // Step 4: login sets the session cookie.
    d.login(&creds).unwrap();
    assert_eq!(d.session().cookie().key, "connect.sid");
    assert!(matches!(d.get_books(), Err(ApiError::NotInLibrary)));

    // Step 5: enter the library.
    d.enter_library().unwrap();
    assert!(d.session().has_library_access());

    // Step 6: empty catalog.
    let books = d.get_books().unwrap();
    assert_eq!(books.as_array().unwrap().len(), 0);

    // Step 7: add a book and find it in the listing.
    let book = NewBook {
        title: "The Left Hand of Darkness".to_string(),
        author: "Ursula K. Le Guin".to_string(),
        genre: "Science fiction".to_string(),
        publisher: "Ace".to_string(),
        page_count: 286,
    };
    d.add_book(&book).unwrap();
    let books = d.get_books().unwrap();
    let listed = books.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["title"], "The Left Hand of Darkness");
    let id = listed[0]["id"].as_u64().unwrap() as u32;

    // Step 8: fetch it.
    let fetched = d.get_book(id).unwrap();
    assert_eq!(fetched["author"], "Ursula K. Le Guin");
    assert_eq!(fetched["page_count"], 286);

    // Step 9: delete it; a second fetch and delete are 404.
    d.delete_book(id).unwrap();
    let err = d.get_book(id).unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 404, .. }));
    let err = d.delete_book(id).unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 404, .. }));

    // Step 10: logout clears the cookie; logging out again is a precondition failure.
    d.logout().unwrap();
    assert!(d.session().cookie().is_null());
    assert!(matches!(d.logout(), Err(ApiError::NotLoggedIn)));
}

#[test]
fn add_book_with_missing_title_is_rejected() {
    let addr = start_server();
    let mut d = driver(addr);
    let creds = Credentials::new("librarian", "pw");

    d.register(&creds).unwrap();
    d.login(&creds).unwrap();
    d.enter_library().unwrap();

    let book = NewBook {
        title: String::new(),
        author: "Nobody".to_string(),
        genre: "None".to_string(),
        publisher: "Void".to_string(),
        page_count: 10,
    };
    match d.add_book(&book).unwrap_err() {
        ApiError::HttpError { status, message } => {
            assert_eq!(status, 400);
            assert!(message.is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
