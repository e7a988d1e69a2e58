use super::settlement::Settlement;
use crate::domain::amount::Amount;
use crate::domain::event::LoanEvent;
use crate::domain::loan::{Address, Call, Loan, LoanId, Timestamp};
use crate::domain::ports::{ClockBox, EventSinkBox, LedgerBox, LoanStoreBox};
use crate::error::{LoanError, Result};

/// The loan registry: a keyed table of loans and the operations that move them through
/// their lifecycle.
///
/// Mutating operations take `&mut self`, which serializes them: no two operations ever
/// interleave. Each one either commits entirely (state, transfers, notifications) or
/// leaves the store and the ledger exactly as it found them.
pub struct LoanRegistry {
    store: LoanStoreBox,
    ledger: LedgerBox,
    clock: ClockBox,
    events: EventSinkBox,
}

impl LoanRegistry {
    /// Creates a new `LoanRegistry`.
    ///
    /// # Arguments
    ///
    /// * `store` - Where loans and the id counter live.
    /// * `ledger` - Sends value to participants.
    /// * `clock` - Source of the current block time.
    /// * `events` - Receives notifications for committed operations.
    pub fn new(
        store: LoanStoreBox,
        ledger: LedgerBox,
        clock: ClockBox,
        events: EventSinkBox,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
            events,
        }
    }

    /// Locks `call.value` as collateral and opens a loan of the same amount.
    pub async fn request_loan(
        &mut self,
        call: Call,
        interest_rate: u32,
        duration_days: u64,
    ) -> Result<LoanId> {
        if call.value.is_zero() {
            return Err(LoanError::InvalidAmount {
                expected: "more than 0".to_string(),
                supplied: call.value,
            });
        }
        if interest_rate == 0 {
            return Err(LoanError::InvalidParameter(
                "interest rate must be positive".to_string(),
            ));
        }
        if duration_days == 0 {
            return Err(LoanError::InvalidParameter(
                "duration must be positive".to_string(),
            ));
        }

        let mut state = self.store.state().await?;
        let due_date = self.clock.now().plus_days(duration_days)?;
        let id = state.next_id;
        let loan = Loan::request(id, call.caller, call.value, interest_rate, due_date);

        let snapshot = state;
        state.next_id = id.checked_add(1).ok_or(LoanError::Overflow)?;
        state.balance = state.balance.checked_add(call.value)?;

        let mut settlement = Settlement::begin(&*self.store, &*self.ledger, None, snapshot);
        settlement.stage(loan.clone(), state).await?;

        tracing::info!(id, collateral = %loan.collateral_amount, %due_date, "Loan requested");
        self.events.emit(&LoanEvent::LoanRequested {
            id,
            borrower: loan.borrower()?.clone(),
            collateral: loan.collateral_amount,
            loan_amount: loan.loan_amount,
            interest_rate,
            due_date,
        });
        Ok(id)
    }

    /// Funds loan `id` with exactly its loan amount, forwarding the value to the borrower.
    pub async fn fund_loan(&mut self, call: Call, id: LoanId) -> Result<()> {
        let loan = self.load(id).await?;
        loan.ensure_unfunded()?;
        loan.ensure_exact_amount(call.value)?;
        loan.ensure_fundable_at(self.clock.now())?;

        let state = self.store.state().await?;
        let borrower = loan.borrower()?.clone();
        let mut funded = loan.clone();
        funded.lender = Some(call.caller.clone());
        funded.is_funded = true;

        // The supplied value passes straight through, the held balance is unchanged.
        let mut settlement = Settlement::begin(&*self.store, &*self.ledger, Some(loan), state);
        settlement.stage(funded, state).await?;
        settlement.pay(&borrower, call.value).await?;

        tracing::info!(id, lender = %call.caller, "Loan funded");
        self.events.emit(&LoanEvent::LoanFunded {
            id,
            lender: call.caller,
        });
        Ok(())
    }

    /// Repays loan `id` with principal plus interest and returns the collateral.
    ///
    /// Anything supplied above the total repayment stays with the registry.
    pub async fn repay_loan(&mut self, call: Call, id: LoanId) -> Result<()> {
        let loan = self.load(id).await?;
        loan.ensure_outstanding()?;
        loan.ensure_repayable_at(self.clock.now())?;
        let total = loan.total_repayment()?;
        if call.value < total {
            return Err(LoanError::InvalidAmount {
                expected: format!("at least {total}"),
                supplied: call.value,
            });
        }

        let snapshot = self.store.state().await?;
        let borrower = loan.borrower()?.clone();
        let lender = loan.lender()?.clone();
        let collateral = loan.collateral_amount;

        let mut state = snapshot;
        state.balance = state
            .balance
            .checked_add(call.value)?
            .checked_sub(total)?
            .checked_sub(collateral)?;
        let mut repaid = loan.clone();
        repaid.is_repaid = true;
        repaid.is_active = false;

        let mut settlement =
            Settlement::begin(&*self.store, &*self.ledger, Some(loan), snapshot);
        settlement.stage(repaid, state).await?;
        settlement.pay(&lender, total).await?;
        settlement.pay(&borrower, collateral).await?;

        tracing::info!(id, %total, supplied = %call.value, "Loan repaid");
        self.events.emit(&LoanEvent::LoanRepaid { id });
        self.events
            .emit(&LoanEvent::CollateralReturned { id, borrower });
        Ok(())
    }

    /// Hands the collateral of a defaulted loan to its lender.
    pub async fn claim_collateral(&mut self, caller: &Address, id: LoanId) -> Result<()> {
        let loan = self.load(id).await?;
        loan.ensure_outstanding()?;
        loan.ensure_lender(caller)?;
        loan.ensure_defaulted_at(self.clock.now())?;

        let snapshot = self.store.state().await?;
        let collateral = loan.collateral_amount;
        let mut state = snapshot;
        state.balance = state.balance.checked_sub(collateral)?;
        let mut claimed = loan.clone();
        claimed.is_active = false;

        let mut settlement =
            Settlement::begin(&*self.store, &*self.ledger, Some(loan), snapshot);
        settlement.stage(claimed, state).await?;
        settlement.pay(caller, collateral).await?;

        tracing::info!(id, lender = %caller, %collateral, "Collateral claimed");
        self.events.emit(&LoanEvent::CollateralClaimed {
            id,
            lender: caller.clone(),
        });
        Ok(())
    }

    /// Returns loan `id`, or `None` if it was never requested.
    pub async fn get_loan(&self, id: LoanId) -> Result<Option<Loan>> {
        Ok(self.store.get(id).await?.filter(Loan::exists))
    }

    /// Returns loan `id`, or the zero record (unset borrower) if it was never requested.
    pub async fn loan_record(&self, id: LoanId) -> Result<Loan> {
        Ok(self.get_loan(id).await?.unwrap_or_default())
    }

    pub async fn loans(&self) -> Result<Vec<Loan>> {
        self.store.get_all().await
    }

    /// Value currently held by the registry.
    pub async fn balance(&self) -> Result<Amount> {
        Ok(self.store.state().await?.balance)
    }

    /// Latest block time any previous operation or row was processed at.
    pub async fn last_seen(&self) -> Result<Timestamp> {
        Ok(self.store.state().await?.last_seen)
    }

    /// Persists the clock's current time if it is later than anything seen so far.
    pub async fn observe_time(&mut self) -> Result<()> {
        let mut state = self.store.state().await?;
        let now = self.clock.now();
        if now > state.last_seen {
            state.last_seen = now;
            self.store.store_state(state).await?;
        }
        Ok(())
    }

    /// Consumes the registry and returns every loan it holds.
    pub async fn into_results(self) -> Result<Vec<Loan>> {
        self.store.get_all().await
    }

    async fn load(&self, id: LoanId) -> Result<Loan> {
        let loan = self.get_loan(id).await?;
        loan.ok_or_else(|| {
            tracing::debug!(id, "Loan not found");
            LoanError::NotFound(id)
        })
    }
}
