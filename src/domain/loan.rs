use super::amount::Amount;
use crate::error::{LoanError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type LoanId = u64;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Identity of a participant, as authenticated by the calling environment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Seconds since the epoch, as reported by the host's [`Clock`](super::ports::Clock).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Returns the timestamp `days` whole days after `self`.
    pub fn plus_days(self, days: u64) -> Result<Self> {
        days.checked_mul(SECONDS_PER_DAY)
            .and_then(|secs| self.0.checked_add(secs))
            .map(Self)
            .ok_or(LoanError::Overflow)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An invocation of a registry operation: who is calling and what value they attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub caller: Address,
    pub value: Amount,
}

impl Call {
    pub fn new(caller: impl Into<Address>, value: Amount) -> Self {
        Self {
            caller: caller.into(),
            value,
        }
    }
}

/// A collateralized loan.
///
/// `Loan::default()` is the zero record: id 0, no borrower, nothing locked. A record
/// with an unset borrower never refers to a requested loan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower: Option<Address>,
    pub lender: Option<Address>,
    pub collateral_amount: Amount,
    pub loan_amount: Amount,
    /// Flat interest in basis points.
    pub interest_rate: u32,
    pub due_date: Timestamp,
    pub is_active: bool,
    pub is_funded: bool,
    pub is_repaid: bool,
}

impl Loan {
    /// A freshly requested loan, collateralized 1:1.
    pub fn request(
        id: LoanId,
        borrower: Address,
        collateral: Amount,
        interest_rate: u32,
        due_date: Timestamp,
    ) -> Self {
        Self {
            id,
            borrower: Some(borrower),
            lender: None,
            collateral_amount: collateral,
            loan_amount: collateral,
            interest_rate,
            due_date,
            is_active: true,
            is_funded: false,
            is_repaid: false,
        }
    }

    pub fn exists(&self) -> bool {
        self.borrower.is_some()
    }

    /// Principal plus flat interest owed at repayment.
    pub fn total_repayment(&self) -> Result<Amount> {
        let interest = self.loan_amount.interest(self.interest_rate)?;
        self.loan_amount.checked_add(interest)
    }

    pub fn borrower(&self) -> Result<&Address> {
        self.borrower.as_ref().ok_or(LoanError::NotFound(self.id))
    }

    pub fn lender(&self) -> Result<&Address> {
        self.lender.as_ref().ok_or(LoanError::InvalidState {
            id: self.id,
            state: "not funded",
        })
    }

    // Guards. Each returns the typed error for the first violated precondition.

    pub fn ensure_unfunded(&self) -> Result<()> {
        if self.is_funded {
            return Err(LoanError::InvalidState {
                id: self.id,
                state: "already funded",
            });
        }
        Ok(())
    }

    /// Funded, still active, not yet repaid.
    pub fn ensure_outstanding(&self) -> Result<()> {
        let state = if !self.is_funded {
            "not funded"
        } else if self.is_repaid {
            "already repaid"
        } else if !self.is_active {
            "no longer active"
        } else {
            return Ok(());
        };
        Err(LoanError::InvalidState { id: self.id, state })
    }

    pub fn ensure_lender(&self, caller: &Address) -> Result<()> {
        if self.lender.as_ref() != Some(caller) {
            return Err(LoanError::Unauthorized {
                id: self.id,
                caller: caller.clone(),
                role: "lender",
            });
        }
        Ok(())
    }

    pub fn ensure_exact_amount(&self, supplied: Amount) -> Result<()> {
        if supplied != self.loan_amount {
            return Err(LoanError::InvalidAmount {
                expected: format!("exactly {}", self.loan_amount),
                supplied,
            });
        }
        Ok(())
    }

    /// Funding window: strictly before the due date.
    pub fn ensure_fundable_at(&self, now: Timestamp) -> Result<()> {
        if now >= self.due_date {
            return Err(LoanError::Expired {
                id: self.id,
                due_date: self.due_date,
                now,
            });
        }
        Ok(())
    }

    /// Repayment window: up to and including the due date.
    pub fn ensure_repayable_at(&self, now: Timestamp) -> Result<()> {
        if now > self.due_date {
            return Err(LoanError::Expired {
                id: self.id,
                due_date: self.due_date,
                now,
            });
        }
        Ok(())
    }

    /// Default: strictly after the due date.
    pub fn ensure_defaulted_at(&self, now: Timestamp) -> Result<()> {
        if now <= self.due_date {
            return Err(LoanError::NotYetDue {
                id: self.id,
                due_date: self.due_date,
                now,
            });
        }
        Ok(())
    }
}

/// Registry-wide bookkeeping persisted next to the loans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryState {
    /// Id handed to the next request.
    pub next_id: LoanId,
    /// Value held by the registry: escrowed collateral plus retained overpayment.
    pub balance: Amount,
    /// Latest block time the registry has observed.
    #[serde(default)]
    pub last_seen: Timestamp,
}
