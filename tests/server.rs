//! End-to-end tests: boot an application and serve it over TCP.

use std::time::Duration;

use reqwest::redirect::Policy;
use trellis::observability::{LogStream, SharedBuffer};
use trellis::Loader;

mod common;

use common::{bookshelf_actions, spawn_server, TempApp, BOOKSHELF_ROUTES};

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_serves_routes_with_default_headers() {
    let app_dir = TempApp::new("", BOOKSHELF_ROUTES);
    let buffer = SharedBuffer::new();
    let sink = buffer.clone();
    let app = Loader::new(app_dir.config_path(), bookshelf_actions())
        .configure_logger(move |logger| {
            logger.set_stream(LogStream::Buffer(sink.clone()));
        })
        .load()
        .unwrap();

    let (addr, shutdown, handle) = spawn_server(app).await;
    let client = client();

    let res = client.get(format!("http://{}/books/7", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-frame-options"], "DENY");
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "Book #7");

    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Welcome to the bookshelf");

    let res = client.post(format!("http://{}/books", addr)).send().await.unwrap();
    assert_eq!(res.status(), 201);

    let res = client.get(format!("http://{}/library", addr)).send().await.unwrap();
    assert_eq!(res.status(), 301);
    assert_eq!(res.headers()["location"], "/");

    let res = client.get(format!("http://{}/authors", addr)).send().await.unwrap();
    assert_eq!(res.status(), 404);

    // Action logs and request lines both go to the application logger.
    let lines = buffer.lines();
    assert!(lines.iter().any(|l| l.contains("Showing book") && l.contains("book_id=7")));
    assert!(lines.iter().any(|l| l.contains("GET 200 /books/7")));
    assert!(lines.iter().any(|l| l.contains("GET 404 /authors")));
    assert!(lines.iter().all(|l| l.starts_with("[Web] ")));

    assert_eq!(shutdown.trigger(), 1);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_action_errors_follow_handle_exceptions() {
    let handled_dir = TempApp::new("", BOOKSHELF_ROUTES);
    let exposed_dir = TempApp::new("[controller]\nhandle_exceptions = false\n", BOOKSHELF_ROUTES);

    for (dir, expected_body) in [
        (&handled_dir, "Internal Server Error"),
        (&exposed_dir, "book 0 is corrupt"),
    ] {
        let app = Loader::new(dir.config_path(), bookshelf_actions())
            .configure_logger(|logger| {
                logger.set_stream(LogStream::Buffer(SharedBuffer::new()));
            })
            .load()
            .unwrap();
        let (addr, shutdown, _handle) = spawn_server(app).await;

        let res = client().get(format!("http://{}/books/0", addr)).send().await.unwrap();
        assert_eq!(res.status(), 500);
        assert_eq!(res.text().await.unwrap(), expected_body);

        let res = client().get(format!("http://{}/books/abc", addr)).send().await.unwrap();
        assert_eq!(res.status(), 400);

        shutdown.trigger();
    }
}

#[tokio::test]
async fn test_trailing_slash_is_not_significant() {
    let app_dir = TempApp::new("", BOOKSHELF_ROUTES);
    let app = Loader::new(app_dir.config_path(), bookshelf_actions())
        .configure_logger(|logger| {
            logger.set_stream(LogStream::Buffer(SharedBuffer::new()));
        })
        .load()
        .unwrap();

    let recognized = app.routes().recognize(&reqwest::Method::GET, "/books/7/").unwrap();
    assert_eq!(recognized.route.endpoint.to_string(), "books#show");

    let (addr, shutdown, _handle) = spawn_server(app).await;
    let client = client();

    let res = client.get(format!("http://{}/books/7/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Book #7");

    let res = client.get(format!("http://{}/library/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 301);

    shutdown.trigger();
}

#[tokio::test]
async fn test_lenient_boot_answers_not_implemented() {
    let app_dir = TempApp::new("", BOOKSHELF_ROUTES);
    let app = Loader::new(app_dir.config_path(), trellis::frameworks::ActionRegistry::new())
        .lenient()
        .configure_logger(|logger| {
            logger.set_stream(LogStream::Buffer(SharedBuffer::new()));
        })
        .load()
        .unwrap();
    let (addr, shutdown, _handle) = spawn_server(app).await;

    let res = client().get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 501);
    assert_eq!(res.text().await.unwrap(), "Web::Controllers::Home::Index is not implemented");

    shutdown.trigger();
}
