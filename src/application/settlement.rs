use crate::domain::amount::Amount;
use crate::domain::loan::{Address, Loan, LoanId, RegistryState};
use crate::domain::ports::{Ledger, LoanStore};
use crate::error::{LoanError, Result};

/// Commit-or-abort wrapper around a single registry operation.
///
/// The post-state is staged into the store in one atomic write before any value leaves
/// the registry, so a recipient observing the store mid-transfer already sees the final
/// flags. If staging or a credit fails, the snapshots taken at [`Settlement::begin`] are
/// written back and every completed credit is reversed (newest first).
pub struct Settlement<'a> {
    store: &'a dyn LoanStore,
    ledger: &'a dyn Ledger,
    loan_snapshot: Option<Loan>,
    state_snapshot: RegistryState,
    staged: Option<LoanId>,
    credits: Vec<(Address, Amount)>,
}

impl<'a> Settlement<'a> {
    /// `loan_snapshot` is `None` when the operation creates the loan.
    pub fn begin(
        store: &'a dyn LoanStore,
        ledger: &'a dyn Ledger,
        loan_snapshot: Option<Loan>,
        state_snapshot: RegistryState,
    ) -> Self {
        Self {
            store,
            ledger,
            loan_snapshot,
            state_snapshot,
            staged: None,
            credits: Vec::new(),
        }
    }

    pub async fn stage(&mut self, loan: Loan, state: RegistryState) -> Result<()> {
        let id = loan.id;
        self.staged = Some(id);
        if let Err(err) = self.store.commit(loan, state).await {
            tracing::warn!(id, error = %err, "Staging failed, restoring snapshot");
            if let Err(restore_err) = self.restore().await {
                tracing::error!(id, error = %restore_err, "Failed to restore snapshot");
            }
            return Err(err);
        }
        Ok(())
    }

    pub async fn pay(&mut self, to: &Address, amount: Amount) -> Result<()> {
        match self.ledger.credit(to, amount).await {
            Ok(()) => {
                self.credits.push((to.clone(), amount));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%to, %amount, error = %err, "Transfer refused, unwinding");
                self.unwind().await;
                Err(LoanError::TransferFailed {
                    to: to.clone(),
                    amount,
                })
            }
        }
    }

    async fn restore(&self) -> Result<()> {
        match (&self.loan_snapshot, self.staged) {
            (Some(loan), _) => self.store.commit(loan.clone(), self.state_snapshot).await,
            (None, Some(id)) => self.store.discard(id, self.state_snapshot).await,
            (None, None) => self.store.store_state(self.state_snapshot).await,
        }
    }

    /// Restores the store first, then attempts every reversal even if one fails.
    async fn unwind(&mut self) {
        if let Err(err) = self.restore().await {
            tracing::error!(error = %err, "Failed to restore snapshot during unwind");
        }
        while let Some((to, amount)) = self.credits.pop() {
            if let Err(err) = self.ledger.reverse(&to, amount).await {
                tracing::error!(%to, %amount, error = %err, "Failed to reverse credit");
            }
        }
    }
}
