//! CLI argument parsing for the config file path.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "tasklist-server")]
pub struct Cli {
    /// Path to the YAML config file.
    #[arg(long, default_value = "config.yaml")]
    pub config: std::path::PathBuf,
}
