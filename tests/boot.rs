//! Boot sequence tests.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use trellis::frameworks::ActionRegistry;
use trellis::lifecycle::BootError;
use trellis::observability::{LogStream, SharedBuffer};
use trellis::routing::RouteError;
use trellis::Loader;

mod common;

use common::{bookshelf_actions, TempApp, BOOKSHELF_ROUTES};

#[test]
fn test_concurrent_loads_share_one_boot() {
    let app_dir = TempApp::new("", BOOKSHELF_ROUTES);
    let boots = Arc::new(AtomicUsize::new(0));
    let counter = boots.clone();

    let loader = Loader::new(app_dir.config_path(), bookshelf_actions()).configure_logger(move |logger| {
        counter.fetch_add(1, Ordering::SeqCst);
        logger.set_stream(LogStream::Buffer(SharedBuffer::new()));
    });

    let apps: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| loader.load().unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(boots.load(Ordering::SeqCst), 1);
    assert!(apps.iter().all(|app| Arc::ptr_eq(app, &apps[0])));
}

#[test]
fn test_boot_from_file() {
    let app_dir = TempApp::new(
        r#"
        [application]
        name = "bookshelf"
        load_paths = ["controllers", "views"]

        [view]
        root = "templates"
        layout = "application"

        [logger]
        stream = "log/bookshelf.log"
        level = "info"
        format = "json"
        filters = ["password"]
        "#,
        BOOKSHELF_ROUTES,
    );
    app_dir.write("views/.keep", "");
    app_dir.write("templates/books/show.html", "<h1>{{ title }}</h1>");
    app_dir.write("templates/application.html", "<main>{{ yield }}</main>");

    let app = Loader::new(app_dir.config_path(), bookshelf_actions()).load().unwrap();

    assert_eq!(app.namespace().name(), "Bookshelf");
    assert_eq!(app.controller().action_namespace(), "Bookshelf::Controllers");
    assert_eq!(app.view().view_namespace(), "Bookshelf::Views");
    assert_eq!(app.load_paths(), [app_dir.dir.join("./views")]);
    assert_eq!(app.routes().len(), 3);
    assert_eq!(app.routes().path("book", &[("id", "5")]).unwrap(), "/books/5");

    let locals = match json!({"title": "Dune"}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    assert_eq!(app.view().render("books/show", &locals).unwrap(), "<main><h1>Dune</h1></main>");

    app.with_logger(|| {
        tracing::debug!("below threshold");
        tracing::info!(password = "secret", "signed in");
    });

    let log = fs::read_to_string(app_dir.dir.join("log/bookshelf.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    let entry: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(entry["app"], "Bookshelf");
    assert_eq!(entry["severity"], "INFO");
    assert_eq!(entry["message"], "signed in");
    assert_eq!(entry["password"], "[FILTERED]");
}

#[test]
fn test_logger_app_name_setting_wins_over_namespace() {
    let app_dir = TempApp::new("[logger]\napp_name = \"shelf\"\n", BOOKSHELF_ROUTES);
    let buffer = SharedBuffer::new();
    let sink = buffer.clone();

    let app = Loader::new(app_dir.config_path(), bookshelf_actions())
        .configure_logger(move |logger| {
            logger.set_stream(LogStream::Buffer(sink.clone()));
        })
        .load()
        .unwrap();

    app.with_logger(|| tracing::warn!("careful"));
    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[shelf] [WARN]"), "{}", lines[0]);
}

#[test]
fn test_failed_boot_can_be_retried() {
    let app_dir = TempApp::new("", BOOKSHELF_ROUTES);
    let loader = Loader::new(app_dir.config_path(), ActionRegistry::new());

    let err = loader.load().unwrap_err();
    assert!(matches!(
        err,
        BootError::Routes {
            source: RouteError::UnknownEndpoint { .. },
            ..
        }
    ));
    assert!(err.to_string().contains("Web::Controllers::Home::Index"));
    assert!(!loader.is_loaded());

    let err_again = loader.load().unwrap_err();
    assert!(matches!(err_again, BootError::Routes { .. }));
}

#[test]
fn test_invalid_routes_file() {
    let app_dir = TempApp::new(
        "",
        "[[route]]\nmethod = \"GET\"\npath = \"books\"\nto = \"books#index\"\n",
    );
    let err = Loader::new(app_dir.config_path(), ActionRegistry::new())
        .load()
        .unwrap_err();

    match err {
        BootError::Routes { path, source } => {
            assert!(path.ends_with("config/routes.toml"));
            assert!(matches!(source, RouteError::InvalidPath { .. }));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_invalid_config_file() {
    let app_dir = TempApp::new("[listener]\nbind_address = \"nowhere\"\n", BOOKSHELF_ROUTES);
    let err = Loader::new(app_dir.config_path(), bookshelf_actions())
        .load()
        .unwrap_err();

    assert!(matches!(err, BootError::Config { .. }));
    assert!(err.to_string().contains("listener.bind_address"));
}

#[tokio::test]
async fn test_logged_future_writes_to_application_logger() {
    let app_dir = TempApp::new("", BOOKSHELF_ROUTES);
    let buffer = SharedBuffer::new();
    let sink = buffer.clone();
    let app = Loader::new(app_dir.config_path(), bookshelf_actions())
        .configure_logger(move |logger| {
            logger.set_stream(LogStream::Buffer(sink.clone()));
        })
        .load()
        .unwrap();

    let job = tokio::spawn(app.logged(async {
        tokio::task::yield_now().await;
        tracing::info!(job = "reindex", "Background job finished");
    }));
    job.await.unwrap();
    tracing::info!("not attached to the application");

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Background job finished"));
    assert!(lines[0].contains("job=reindex"));
}
