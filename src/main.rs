//! Daemon entry point: parses configuration, wires up structured
//! logging, and serves the `/execute` HTTP endpoint over a shared,
//! mutex-guarded [`Context`].

mod args;
mod binio;
mod commands;
mod config;
mod context;
mod dispatcher;
mod error;
mod fs;
mod http;
mod inode;
mod mbr;
mod registry;
mod report;
mod session;
mod superblock;
mod users_db;

use clap::Parser;
use context::Context;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = config::Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    if let Err(err) = std::env::set_current_dir(&config.base_dir) {
        tracing::warn!(base_dir = %config.base_dir, error = %err, "failed to chdir to base directory");
    }

    let ctx: http::SharedContext = Arc::new(Mutex::new(Context::new()));
    let app = http::router(ctx);

    let addr = config.socket_addr();
    tracing::info!(%addr, "miafsd listening");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {addr}: {err}"));
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|err| panic!("server error: {err}"));
}
