//! Trellis command line.
//!
//! ```text
//! trellis --config app.toml check     boot the application and report
//! trellis --config app.toml routes    print the route table
//! trellis --config app.toml serve     boot and serve until SIGINT/SIGTERM
//! ```
//!
//! The binary carries no application code, so it boots leniently: routes
//! whose action is not compiled in answer 501 Not Implemented.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trellis::frameworks::ActionRegistry;
use trellis::lifecycle::signals::spawn_signal_handler;
use trellis::{Application, HttpServer, Loader, Shutdown};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Boot, inspect and serve Trellis applications", long_about = None)]
struct Cli {
    /// Application configuration file.
    #[arg(short, long, default_value = "app.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot the application without serving it
    Check,
    /// Print the route table
    Routes,
    /// Serve the application
    Serve {
        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellis=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let loader = Loader::new(cli.config.clone(), ActionRegistry::new()).lenient();
    let app = loader.load()?;

    match cli.command {
        Commands::Check => {
            println!(
                "{} booted from {}: {} routes, {} redirects, {} load paths",
                app.namespace(),
                app.root().display(),
                app.routes().len(),
                app.routes().redirects().len(),
                app.load_paths().len()
            );
        }
        Commands::Routes => print_routes(&app),
        Commands::Serve { bind } => {
            let address = bind.unwrap_or_else(|| app.config().listener.bind_address.clone());
            let listener = TcpListener::bind(&address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");

            let shutdown = Shutdown::new();
            let server_shutdown = shutdown.subscribe();
            spawn_signal_handler(shutdown);

            HttpServer::new(app).run(listener, server_shutdown).await?;
            tracing::info!("Shutdown complete");
        }
    }

    Ok(())
}

fn print_routes(app: &Application) {
    let namespace = app.controller().action_namespace();
    let mut rows: Vec<[String; 4]> = app
        .routes()
        .iter()
        .map(|route| {
            [
                route.name.clone().unwrap_or_default(),
                route.method.to_string(),
                route.pattern.to_string(),
                route.endpoint.qualify(namespace),
            ]
        })
        .collect();
    for redirect in app.routes().redirects() {
        rows.push([
            String::new(),
            "ANY".to_string(),
            redirect.from.to_string(),
            format!("Redirect ({}) {}", redirect.status.as_u16(), redirect.to),
        ]);
    }

    let mut widths = [0usize; 3];
    for row in &rows {
        for (i, width) in widths.iter_mut().enumerate() {
            *width = (*width).max(row[i].len());
        }
    }
    for [name, method, path, action] in rows {
        println!(
            "{:>w0$} {:<w1$} {:<w2$} {}",
            name,
            method,
            path,
            action,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        );
    }
}
