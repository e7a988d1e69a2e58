use super::amount::Amount;
use super::event::LoanEvent;
use super::loan::{Address, Loan, LoanId, RegistryState, Timestamp};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for loan records and registry bookkeeping.
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn store(&self, loan: Loan) -> Result<()>;
    async fn get(&self, id: LoanId) -> Result<Option<Loan>>;
    /// All loans in ascending id order.
    async fn get_all(&self) -> Result<Vec<Loan>>;
    async fn state(&self) -> Result<RegistryState>;
    async fn store_state(&self, state: RegistryState) -> Result<()>;
    /// Writes `loan` and `state` as one unit: either both land or neither does.
    async fn commit(&self, loan: Loan, state: RegistryState) -> Result<()>;
    /// Removes loan `id` and writes `state` as one unit.
    async fn discard(&self, id: LoanId, state: RegistryState) -> Result<()>;
}

/// The "send value to identity" primitive.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Sends `amount` to `to`. Fails if the recipient refuses the funds.
    async fn credit(&self, to: &Address, amount: Amount) -> Result<()>;
    /// Takes back a credit made earlier in the same operation.
    async fn reverse(&self, to: &Address, amount: Amount) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Subscriber for registry notifications. The registry never waits on a response.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LoanEvent);
}

pub type LoanStoreBox = Box<dyn LoanStore>;
pub type LedgerBox = Box<dyn Ledger>;
pub type ClockBox = Box<dyn Clock>;
pub type EventSinkBox = Box<dyn EventSink>;

pub type LoanStoreFactory = Box<dyn Fn() -> LoanStoreBox + Send + Sync>;
