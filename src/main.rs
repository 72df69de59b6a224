use chrono::Utc;
use clap::Parser;
use libris::application::engine::{
    ApproveOutcome, LibraryEngine, LoanOutcome, RegisterOutcome, ReturnOutcome, UnblockOutcome,
};
use libris::config::EngineConfig;
use libris::domain::book::{BookId, NewBook};
use libris::domain::clock::ManualClock;
use libris::domain::fine::Fine;
use libris::domain::ports::Stores;
use libris::domain::user::{NewUser, UserId};
use libris::error::LibraryError;
use libris::infrastructure::console::ConsoleNotifier;
use libris::infrastructure::in_memory;
use libris::interfaces::csv::event_reader::{EventOp, EventReader, LendingEvent};
use libris::interfaces::csv::standing_writer::StandingWriter;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input lending events CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // The replay pins this clock to each event's date.
    let clock = Arc::new(ManualClock::starting_at(Utc::now()));

    let stores = build_stores(cli.db_path)?;
    let engine = LibraryEngine::new(
        stores,
        Box::new(ConsoleNotifier),
        clock.clone(),
        EngineConfig::default(),
    )
    .into_diagnostic()?;

    // Replay events
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for event_result in reader.events() {
        match event_result {
            Ok(event) => {
                clock.set(event.instant());
                if let Err(e) = apply_event(&engine, event).await {
                    eprintln!("Error applying event: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading event: {}", e);
            }
        }
    }

    // Output final standings
    let standings = engine.standings().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = StandingWriter::new(stdout.lock());
    writer.write_standings(standings).into_diagnostic()?;

    Ok(())
}

fn build_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    let Some(path) = db_path else {
        return Ok(in_memory::stores());
    };

    #[cfg(feature = "storage-rocksdb")]
    {
        let store = libris::infrastructure::rocksdb::RocksDBStore::open(path).into_diagnostic()?;
        Ok(Stores {
            users: Box::new(store.clone()),
            books: Box::new(store.clone()),
            orders: Box::new(store.clone()),
            categories: Box::new(store),
        })
    }
    #[cfg(not(feature = "storage-rocksdb"))]
    {
        let _ = path;
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
        Ok(in_memory::stores())
    }
}

fn require<T>(field: Option<T>, what: &str, op: &str) -> libris::error::Result<T> {
    field.ok_or_else(|| LibraryError::InvalidEvent(format!("{op} requires {what}")))
}

async fn apply_event(engine: &LibraryEngine, event: LendingEvent) -> libris::error::Result<()> {
    match event.op {
        EventOp::Register => {
            let name = require(event.name, "a name", "register")?;
            let email = require(event.email, "an email", "register")?;
            let (first_name, last_name) = match name.split_once(' ') {
                Some((first, last)) => (first.to_string(), last.to_string()),
                None => (name, String::new()),
            };
            match engine
                .register(NewUser {
                    first_name,
                    last_name,
                    email,
                    mobile_number: String::new(),
                })
                .await?
            {
                RegisterOutcome::Registered(_) => {}
                RegisterOutcome::EmailTaken => eprintln!("cannot register: email taken"),
            }
        }
        EventOp::Approve => {
            let user = UserId(require(event.user, "a user", "approve")?);
            match engine.approve(user).await? {
                ApproveOutcome::Approved => {}
                outcome => eprintln!("not approved: {:?} for user {}", outcome, user),
            }
        }
        EventOp::Unblock => {
            let user = UserId(require(event.user, "a user", "unblock")?);
            match engine.unblock(user).await? {
                UnblockOutcome::Unblocked => {}
                outcome => eprintln!("not unblocked: {:?} for user {}", outcome, user),
            }
        }
        EventOp::AddBook => {
            let title = require(event.title, "a title", "add-book")?;
            engine.add_book(NewBook { title, category: None }).await?;
        }
        EventOp::Order => {
            let user = UserId(require(event.user, "a user", "order")?);
            let book = BookId(require(event.book, "a book", "order")?);
            match engine.request_loan(user, book).await? {
                LoanOutcome::Accepted(_) => {}
                LoanOutcome::LimitExceeded => {
                    eprintln!("cannot order: loan limit exceeded for user {}", user)
                }
            }
        }
        EventOp::Return => {
            let user = UserId(require(event.user, "a user", "return")?);
            let book = BookId(require(event.book, "a book", "return")?);
            let settled = Fine(event.amount.unwrap_or(Decimal::ZERO));
            match engine.return_loan(user, book, settled).await? {
                ReturnOutcome::Returned => {}
                ReturnOutcome::NotFound => {
                    eprintln!("no open order for user {} and book {}", user, book)
                }
            }
        }
        EventOp::Sweep => {
            engine.sweep().await?;
        }
    }
    Ok(())
}
