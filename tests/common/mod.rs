//! Shared fixtures for integration tests.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::StatusCode;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use trellis::frameworks::{ActionError, ActionRegistry, ActionRequestExt};
use trellis::{Application, HttpServer, Shutdown};

pub const BOOKSHELF_ROUTES: &str = r#"
[[route]]
method = "GET"
path = "/"
to = "home#index"
name = "root"

[[route]]
method = "GET"
path = "/books/:id"
to = "books#show"
name = "book"

[[route]]
method = "POST"
path = "/books"
to = "books#create"

[[redirect]]
from = "/library"
to = "/"
"#;

/// An application directory in a temp dir, removed on drop.
pub struct TempApp {
    pub dir: PathBuf,
    _tmp: TempDir,
}

impl TempApp {
    pub fn new(app_toml: &str, routes_toml: &str) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        fs::create_dir_all(dir.join("config")).unwrap();
        fs::create_dir_all(dir.join("templates")).unwrap();
        fs::write(dir.join("app.toml"), app_toml).unwrap();
        fs::write(dir.join("config/routes.toml"), routes_toml).unwrap();
        Self { dir, _tmp: tmp }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("app.toml")
    }

    pub fn write(&self, relative: impl AsRef<Path>, contents: &str) {
        let path = self.dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}

/// Actions for `BOOKSHELF_ROUTES`.
#[allow(dead_code)]
pub fn bookshelf_actions() -> ActionRegistry {
    ActionRegistry::new()
        .with("home#index", |_req: Request| async { Ok::<_, ActionError>("Welcome to the bookshelf") })
        .with("books#show", |req: Request| async move {
            let id: u32 = req
                .param("id")
                .and_then(|id| id.parse().ok())
                .ok_or_else(|| ActionError::bad_request("id must be a number"))?;
            tracing::info!(book_id = id, "Showing book");
            if id == 0 {
                return Err(ActionError::internal("book 0 is corrupt"));
            }
            Ok::<_, ActionError>(format!("Book #{}", id))
        })
        .with("books#create", |_req: Request| async {
            Ok::<_, ActionError>((StatusCode::CREATED, "created"))
        })
}

/// Serve `app` on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_server(app: Arc<Application>) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(app);

    let handle = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown, handle)
}
