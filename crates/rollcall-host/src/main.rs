use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use rollcall_host::{AppState, router};
use rollcall_sqlite::SqliteStore;

#[derive(Parser, Debug)]
#[command(name = "rollcall-host", version, about = "Signup desk webhook host")]
struct Args {
    /// Path to the sqlite database
    #[arg(long, default_value = "rollcall.db")]
    db: PathBuf,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1:8090")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();
    let args = Args::parse();

    let store = Arc::new(SqliteStore::open(&args.db)?);
    let state = AppState::new(store.clone(), store.clone(), store);
    let app = router().with_state(state);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, db = %args.db.display(), "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
