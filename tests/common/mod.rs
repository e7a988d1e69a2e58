#![allow(dead_code)]

use loan_registry::application::registry::LoanRegistry;
use loan_registry::domain::amount::{Amount, UNITS_PER_COIN};
use loan_registry::domain::loan::{Call, Timestamp};
use loan_registry::domain::ports::LedgerBox;
use loan_registry::infrastructure::clock::ManualClock;
use loan_registry::infrastructure::in_memory::{InMemoryEventLog, InMemoryLedger, InMemoryLoanStore};
use std::io::{Error, Write};
use tempfile::NamedTempFile;

pub const DAY: u64 = 86_400;
pub const START: Timestamp = Timestamp(1_700_000_000);

pub struct Harness {
    pub registry: LoanRegistry,
    pub store: InMemoryLoanStore,
    pub ledger: InMemoryLedger,
    pub clock: ManualClock,
    pub events: InMemoryEventLog,
}

pub fn harness() -> Harness {
    let ledger = InMemoryLedger::new();
    harness_with_ledger(ledger.clone(), |_| Box::new(ledger))
}

/// Builds a registry whose transfers go through the ledger returned by `transfers`,
/// which is handed the registry's store. `ledger` is what the harness exposes for
/// balance assertions.
pub fn harness_with_ledger(
    ledger: InMemoryLedger,
    transfers: impl FnOnce(InMemoryLoanStore) -> LedgerBox,
) -> Harness {
    let store = InMemoryLoanStore::new();
    let clock = ManualClock::new(START);
    let events = InMemoryEventLog::new();
    let registry = LoanRegistry::new(
        Box::new(store.clone()),
        transfers(store.clone()),
        Box::new(clock.clone()),
        Box::new(events.clone()),
    );
    Harness {
        registry,
        store,
        ledger,
        clock,
        events,
    }
}

/// `hundredths` of a coin.
pub fn coins(hundredths: u128) -> Amount {
    Amount::new(UNITS_PER_COIN / 100 * hundredths)
}

pub fn call(caller: &str, value: Amount) -> Call {
    Call::new(caller, value)
}

/// Writes a command CSV with the standard header followed by `rows`.
pub fn commands_file(rows: &[&str]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "type, caller, loan, amount, rate, days, time")?;
    for row in rows {
        writeln!(file, "{row}")?;
    }
    file.flush()?;
    Ok(file)
}
