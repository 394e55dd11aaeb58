use std::sync::Arc;

use anyhow::Context;
use bookstore::{
    cli_args::CliArgs,
    server::{Server, ServerConfig},
    store::{BookStore, InMemoryBookStore, PostgresBookStore},
};
use clap::Parser;

fn init_tracing() -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt::Subscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .finish(),
    )
    .context("Failed to set global tracing subscriber")?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "server=trace,bookstore=trace,tower_http=trace");
    }

    init_tracing()?;

    let args = CliArgs::parse();

    tracing::info!(config_file = %args.config_file, "Starting ...");

    let mut config = ServerConfig::from_config_file(&args.config_file)
        .await
        .context("Failed to load configuration")?;

    if let Some(database_url) = args.database_url {
        config = config.with_database_url(database_url);
    }

    if let Some(error_verbosity) = args.error_verbosity {
        config = config.with_error_verbosity(error_verbosity);
    }

    let store: Arc<dyn BookStore> = match args.in_memory {
        true => {
            tracing::warn!("Using in-memory store, books are lost on shutdown");

            Arc::new(InMemoryBookStore::new())
        }
        false => {
            let store = PostgresBookStore::connect(config.database().url())
                .await
                .context("Failed to connect to the database")?;

            if config.database().create_schema() {
                store
                    .ensure_schema()
                    .await
                    .context("Failed to create the books table")?;
            }

            Arc::new(store)
        }
    };

    let server = Server::new(config, store);

    server.run().await?;

    Ok(())
}
