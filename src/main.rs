use clap::Parser;
use loan_registry::application::registry::LoanRegistry;
use loan_registry::domain::loan::{Address, Timestamp};
use loan_registry::domain::ports::LoanStoreBox;
use loan_registry::infrastructure::clock::ManualClock;
use loan_registry::infrastructure::in_memory::{InMemoryEventLog, InMemoryLedger, InMemoryLoanStore};
use loan_registry::infrastructure::tracing_sink::{FanOutSink, TracingEventSink};
use loan_registry::interfaces::csv::command_reader::CommandReader;
use loan_registry::interfaces::csv::loan_writer::{BalanceWriter, LoanWriter};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input loan commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Write every emitted loan event to this file as JSON lines
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write the value each participant received to this file as CSV
    #[arg(long)]
    balances: Option<PathBuf>,

    /// Participant whose account refuses incoming transfers (repeatable)
    #[arg(long = "reject", value_name = "ADDRESS")]
    rejecting: Vec<String>,
}

fn open_store(db_path: Option<&Path>) -> Result<LoanStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            use loan_registry::infrastructure::rocksdb::RocksDBStore;
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryLoanStore::new()))
        }
        None => Ok(Box::new(InMemoryLoanStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let store = open_store(cli.db_path.as_deref())?;
    let ledger = InMemoryLedger::new();
    for address in cli.rejecting {
        ledger.reject(Address::new(address)).await;
    }
    let clock = ManualClock::new(Timestamp::default());
    let event_log = InMemoryEventLog::new();
    let sink = FanOutSink(vec![Box::new(event_log.clone()), Box::new(TracingEventSink)]);

    let mut registry = LoanRegistry::new(
        store,
        Box::new(ledger.clone()),
        Box::new(clock.clone()),
        Box::new(sink),
    );
    // Resume from the latest time a previous run observed.
    clock.set(registry.last_seen().await.into_diagnostic()?).into_diagnostic()?;

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        let command = match command {
            Ok(command) => command,
            Err(e) => {
                eprintln!("Error reading command: {}", e);
                continue;
            }
        };
        if let Some(time) = command.time
            && let Err(e) = clock.set(time)
        {
            eprintln!("Error reading command: {}", e);
            continue;
        }
        if let Err(e) = registry.observe_time().await {
            eprintln!("Error processing command: {}", e);
            continue;
        }
        if let Err(e) = command.apply(&mut registry).await {
            eprintln!("Error processing command: {}", e);
        }
    }

    if let Some(path) = cli.events {
        let mut out = BufWriter::new(File::create(path).into_diagnostic()?);
        for event in event_log.events() {
            serde_json::to_writer(&mut out, &event).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
        out.flush().into_diagnostic()?;
    }

    if let Some(path) = cli.balances {
        let file = File::create(path).into_diagnostic()?;
        BalanceWriter::new(file)
            .write_balances(&ledger.balances().await)
            .into_diagnostic()?;
    }

    let loans = registry.into_results().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = LoanWriter::new(stdout.lock());
    writer.write_loans(&loans).into_diagnostic()?;

    Ok(())
}
