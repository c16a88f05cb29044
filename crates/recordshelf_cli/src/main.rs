//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the configured database.
//! - Print catalogue counts and the blob bucket without starting a server.

use recordshelf_core::db::open_db;
use recordshelf_core::{
    init_logging, AppConfig, BookService, Collection, FsBlobStore, RecordService,
    SqliteBookRepository, SqliteRecordRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("recordshelf: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;

    if let Some(log_dir) = config.log_dir.as_deref().and_then(|dir| dir.to_str()) {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("recordshelf_core ping={}", recordshelf_core::ping());
    println!("recordshelf_core version={}", recordshelf_core::core_version());

    let conn = open_db(&config.db_path)?;
    println!("db path={}", config.db_path.display());

    for collection in Collection::ALL {
        let service = RecordService::new(SqliteRecordRepository::try_new(&conn, collection)?);
        let records = service.list_records(None, 0)?;
        println!("collection={} records={}", collection.label(), records.len());
    }

    let books = BookService::new(SqliteBookRepository::try_new(&conn)?);
    println!("fixed_books={}", books.list_books(None, 0)?.len());
    let store = FsBlobStore::new(&config.blob_root, &config.bucket)?;
    println!(
        "blob bucket={} root={}",
        store.bucket(),
        config.blob_root.display()
    );

    Ok(())
}
