//! Bookshelf demo application.
//!
//! ```text
//! cargo run --example bookshelf
//! curl http://127.0.0.1:2300/books/1
//! ```

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use axum::extract::Request;
use axum::response::Html;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trellis::frameworks::{ActionError, ActionRegistry, ActionRequestExt};
use trellis::lifecycle::signals::spawn_signal_handler;
use trellis::{Application, HttpServer, Loader, Shutdown};

const BOOKS: &[(&str, &str)] = &[
    ("Dune", "Frank Herbert"),
    ("The Left Hand of Darkness", "Ursula K. Le Guin"),
    ("Neuromancer", "William Gibson"),
];

static APP: OnceLock<Arc<Application>> = OnceLock::new();

fn app() -> Result<&'static Arc<Application>, ActionError> {
    APP.get().ok_or_else(|| ActionError::internal("application not booted"))
}

fn locals(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn render(template: &str, locals: Map<String, Value>) -> Result<Html<String>, ActionError> {
    app()?
        .view()
        .render(template, &locals)
        .map(Html)
        .map_err(|e| ActionError::internal(e.to_string()))
}

fn actions() -> ActionRegistry {
    ActionRegistry::new()
        .with("books#index", |_req: Request| async {
            let routes = app()?.routes();
            let mut items = String::new();
            for (i, (title, _)) in BOOKS.iter().enumerate() {
                let id = (i + 1).to_string();
                let path = routes
                    .path("book", &[("id", id.as_str())])
                    .map_err(|e| ActionError::internal(e.to_string()))?;
                items.push_str(&format!("<li><a href=\"{}\">{}</a></li>", path, title));
            }
            render("books/index", locals(json!({ "books": items })))
        })
        .with("books#show", |req: Request| async move {
            let index: usize = req
                .param("id")
                .and_then(|id| id.parse().ok())
                .ok_or_else(|| ActionError::bad_request("id must be a number"))?;
            let (title, author) = index
                .checked_sub(1)
                .and_then(|i| BOOKS.get(i))
                .ok_or_else(|| ActionError::not_found("no such book"))?;
            tracing::info!(book = %title, "Showing book");
            render("books/show", locals(json!({ "title": title, "author": author })))
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellis=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/bookshelf/app.toml");
    let app = Loader::new(config, actions()).load()?;
    let _ = APP.set(app.clone());

    let listener = TcpListener::bind(&app.config().listener.bind_address).await?;
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    HttpServer::new(app).run(listener, server_shutdown).await?;
    Ok(())
}
