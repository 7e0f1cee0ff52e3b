//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// Notevault - multi-tenant note service with revocable bearer sessions
#[derive(Parser, Debug)]
#[command(name = "notevault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "NOTEVAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "NOTEVAULT_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "NOTEVAULT_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "NOTEVAULT_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "NOTEVAULT_LOG_FORMAT")]
    pub log_format: Option<String>,
}
