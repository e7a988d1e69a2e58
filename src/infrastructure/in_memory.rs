use crate::domain::amount::Amount;
use crate::domain::event::LoanEvent;
use crate::domain::loan::{Address, Loan, LoanId, RegistryState};
use crate::domain::ports::{EventSink, Ledger, LoanStore};
use crate::error::{LoanError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;

/// A thread-safe in-memory store for loans.
///
/// Uses `Arc<RwLock<..>>` so clones share the same table, which lets tests observe the
/// store while the registry owns it. Loans are kept in a `BTreeMap` to list them in id
/// order.
#[derive(Default, Clone)]
pub struct InMemoryLoanStore {
    loans: Arc<RwLock<BTreeMap<LoanId, Loan>>>,
    state: Arc<RwLock<RegistryState>>,
}

impl InMemoryLoanStore {
    /// Creates a new, empty in-memory loan store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn store(&self, loan: Loan) -> Result<()> {
        let mut loans = self.loans.write().await;
        loans.insert(loan.id, loan);
        Ok(())
    }

    async fn get(&self, id: LoanId) -> Result<Option<Loan>> {
        let loans = self.loans.read().await;
        Ok(loans.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Loan>> {
        let loans = self.loans.read().await;
        Ok(loans.values().cloned().collect())
    }

    async fn state(&self) -> Result<RegistryState> {
        Ok(*self.state.read().await)
    }

    async fn store_state(&self, state: RegistryState) -> Result<()> {
        *self.state.write().await = state;
        Ok(())
    }

    async fn commit(&self, loan: Loan, state: RegistryState) -> Result<()> {
        let mut loans = self.loans.write().await;
        let mut current = self.state.write().await;
        loans.insert(loan.id, loan);
        *current = state;
        Ok(())
    }

    async fn discard(&self, id: LoanId, state: RegistryState) -> Result<()> {
        let mut loans = self.loans.write().await;
        let mut current = self.state.write().await;
        loans.remove(&id);
        *current = state;
        Ok(())
    }
}

/// In-memory value transfers.
///
/// Tracks the total each address has received from the registry. Addresses registered
/// through [`InMemoryLedger::reject`] refuse every transfer, standing in for a recipient
/// whose acceptance logic fails.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    received: Arc<RwLock<HashMap<Address, Amount>>>,
    rejecting: Arc<RwLock<HashSet<Address>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reject(&self, address: Address) {
        self.rejecting.write().await.insert(address);
    }

    pub async fn accept(&self, address: &Address) {
        self.rejecting.write().await.remove(address);
    }

    /// Total received by `address`; zero if it never received anything.
    pub async fn received(&self, address: &Address) -> Amount {
        let received = self.received.read().await;
        received.get(address).copied().unwrap_or_default()
    }

    /// Every address that received value, sorted by address.
    pub async fn balances(&self) -> Vec<(Address, Amount)> {
        let received = self.received.read().await;
        let mut balances: Vec<_> = received.iter().map(|(a, v)| (a.clone(), *v)).collect();
        balances.sort();
        balances
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn credit(&self, to: &Address, amount: Amount) -> Result<()> {
        if self.rejecting.read().await.contains(to) {
            return Err(LoanError::TransferFailed {
                to: to.clone(),
                amount,
            });
        }
        let mut received = self.received.write().await;
        let entry = received.entry(to.clone()).or_default();
        *entry = entry.checked_add(amount)?;
        Ok(())
    }

    async fn reverse(&self, to: &Address, amount: Amount) -> Result<()> {
        let mut received = self.received.write().await;
        let entry = received.get_mut(to).ok_or_else(|| {
            LoanError::InternalError(Box::new(std::io::Error::other(format!(
                "no credit to reverse for {to}"
            ))))
        })?;
        *entry = entry.checked_sub(amount)?;
        if entry.is_zero() {
            received.remove(to);
        }
        Ok(())
    }
}

/// Collects every emitted notification in order.
#[derive(Default, Clone)]
pub struct InMemoryEventLog {
    events: Arc<Mutex<Vec<LoanEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LoanEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for InMemoryEventLog {
    fn emit(&self, event: &LoanEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
