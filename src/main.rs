use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::KeyResolver;
use crate::stack::{MemoryStore, StackAdminPanel, StackStore};

mod app;
mod cli;
mod commands;
mod config;
mod search;
mod service;
mod stack;
mod theme;
mod tui;
mod ui;

pub use theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = initialize_logging()?;
    info!("Starting stackadmin");

    let args = cli::Args::parse();

    let config = config::load(args.config.as_deref())?;
    let resolver = Arc::new(KeyResolver::new(Arc::new(config.keybindings.clone())));
    let theme = theme::theme_from_name(&config.theme.name);

    let store: Arc<dyn StackStore> = match args.seed.as_ref().or(config.store.seed_file.as_ref()) {
        Some(path) => Arc::new(
            MemoryStore::from_seed_file(path)
                .wrap_err_with(|| format!("Failed to load seed file {}", path.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    };
    let enabled_only = args.enabled_only || config.store.enabled_only;

    let mut app = App::new(resolver.clone(), theme);
    let panel = StackAdminPanel::new(store, resolver, app.notifier(), enabled_only);
    app.run(Box::new(panel)).await?;

    Ok(())
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = dirs::data_local_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("stackadmin").join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "stackadmin.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}
