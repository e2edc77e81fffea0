//! Daemon configuration: bind address, port, base directory for
//! relative disk paths, and log level. Sourced from `clap` derive flags
//! with environment-variable fallback, the way this corpus's sibling
//! daemon tools take their argument surface.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "miafsd", about = "Ext2-like disk-image filesystem emulator daemon")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[arg(long, env = "MIAFS_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Port the HTTP server listens on.
    #[arg(long, env = "MIAFS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Base directory relative disk paths are resolved against.
    #[arg(long, env = "MIAFS_BASE_DIR", default_value = ".")]
    pub base_dir: String,

    /// tracing-subscriber filter directive, e.g. "info" or "miafs=debug".
    #[arg(long, env = "MIAFS_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
