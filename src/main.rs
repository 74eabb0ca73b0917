//! Course Storage Daemon
//!
//! Stores the course content tree and per-user interaction records behind a
//! JSON HTTP API. Sits behind a gateway that authenticates sessions and
//! forwards the caller's identity in headers.
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults
//! course-storage
//!
//! # Start with custom config
//! course-storage --config /path/to/config.toml
//!
//! # Start with custom HTTP port
//! course-storage --http-port 8091
//!
//! # Start with custom storage directory
//! course-storage --storage-dir /data/course
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use course_storage::services::events::spawn_logging_listener;
use course_storage::{Config, Database, HttpServer, Services};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "course-storage")]
#[command(about = "Content and progress storage for the course platform")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage directory
    #[arg(long, env = "COURSE_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, env = "COURSE_HTTP_PORT")]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("course_storage=info".parse()?),
        )
        .init();

    let args = Args::parse();

    // Load config
    let mut config = if let Some(config_path) = &args.config {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    // Apply CLI overrides
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(port) = args.http_port {
        config.http_port = port;
    }

    info!(
        storage_dir = %config.storage_dir.display(),
        http_port = config.http_port,
        "Starting course-storage"
    );

    // Ensure storage directory exists
    tokio::fs::create_dir_all(&config.storage_dir).await?;

    // Save default config if it doesn't exist
    let config_path = config.config_path();
    if !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "Created default config");
    }

    let db = Database::open(&config.db_path())?;
    let services = Services::new(db.clone());

    // Audit log every storage event
    let listener_handle = spawn_logging_listener(services.events.clone());

    let http_addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let http_server = Arc::new(HttpServer::new(services, db.clone(), http_addr));

    info!("HTTP API available at http://{}", http_addr);
    info!("Endpoints:");
    info!("  GET  /health                    - Health check");
    info!("  GET  /chapters                  - Ordered content tree");
    info!("  PUT  /chapters/sync             - Replace the tree snapshot (admin)");
    info!("  GET  /lessons/metadata          - Caller's progress snapshot");
    info!("  GET  /lessons/{{id}}              - Lesson with comments");
    info!("  POST /lessons/{{id}}/completed    - Mark completed (DELETE unmarks)");
    info!("  POST /lessons/{{id}}/liked        - Like (DELETE unlikes)");
    info!("  POST /lessons/{{id}}/saved        - Save (DELETE unsaves)");
    info!("  PUT  /lessons/{{id}}/rating       - Rate 1 to 5");
    info!("  POST /lessons/{{id}}/comments     - Add a comment");
    info!("  PUT  /lessons/{{id}}/content      - Edit content fields (admin)");
    info!("Press Ctrl+C to stop.");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
    };

    tokio::select! {
        result = http_server.run() => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
            }
        }
        _ = shutdown => {}
    }

    listener_handle.abort();

    // Print stats before exit
    if let Ok(stats) = db.stats() {
        info!(
            chapters = stats.chapter_count,
            lessons = stats.lesson_count,
            comments = stats.comment_count,
            "Final storage stats"
        );
    }

    Ok(())
}
