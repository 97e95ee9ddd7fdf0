//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `revents_core` linkage and storage bootstrap.
//! - Print the first dashboard page of the configured database.
//!
//! Usage: `revents_cli [config.toml]`

use revents_core::{
    init_logging_from_config, open_db, open_db_in_memory, AppStore, CoreConfig, EventService,
    LogNotifier, ServiceContext, SqliteDocumentStore, SystemClock,
};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("revents_core ping={}", revents_core::ping());
    println!("revents_core version={}", revents_core::core_version());

    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("revents_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<String>) -> Result<(), Box<dyn Error>> {
    let config = match config_path {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if init_logging_from_config(&config)? {
        log::info!("event=cli_start module=cli status=ok");
    }

    let conn = match &config.database_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = SqliteDocumentStore::try_new(&conn)?;
    let app_store = Arc::new(AppStore::new());
    let ctx = ServiceContext::new(
        Arc::new(LogNotifier::new(false)),
        Arc::clone(&app_store),
        Arc::new(SystemClock),
    )
    .with_config(&config);
    let events = EventService::new(store, ctx);

    let Some(page) = events.dashboard_feed(None) else {
        return Err("failed to load dashboard".into());
    };
    println!("dashboard items={}", page.len());
    for event in &page {
        println!(
            "{} {} {}{}",
            event.date.to_rfc3339(),
            event.id,
            event.title,
            if event.cancelled { " (cancelled)" } else { "" }
        );
    }
    Ok(())
}
