use clap::Parser;

use crate::error::ErrorVerbosity;

#[derive(Parser)]
#[command(author, about, version)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[clap(long, env = "CONFIG_FILE", default_value = "config.yaml")]
    pub config_file: String,

    /// Overrides `database.url` from the configuration file.
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Overrides `error_verbosity` from the configuration file (`message`, `type` or `full`).
    #[clap(long, env = "ERROR_VERBOSITY", value_enum)]
    pub error_verbosity: Option<ErrorVerbosity>,

    /// Keep books in process memory instead of PostgreSQL.
    #[clap(long)]
    pub in_memory: bool,
}
