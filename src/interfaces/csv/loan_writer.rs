use crate::domain::amount::Amount;
use crate::domain::loan::{Address, Loan, LoanId};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// Output shape of a loan: amounts in coins, the unset lender as an empty field.
#[derive(Debug, Serialize)]
struct LoanRow<'a> {
    id: LoanId,
    borrower: &'a str,
    lender: &'a str,
    collateral: Decimal,
    loan_amount: Decimal,
    interest_rate: u32,
    due_date: u64,
    active: bool,
    funded: bool,
    repaid: bool,
}

impl<'a> LoanRow<'a> {
    fn from_loan(loan: &'a Loan) -> Result<Self> {
        Ok(Self {
            id: loan.id,
            borrower: loan.borrower.as_ref().map_or("", Address::as_str),
            lender: loan.lender.as_ref().map_or("", Address::as_str),
            collateral: loan.collateral_amount.to_coins()?,
            loan_amount: loan.loan_amount.to_coins()?,
            interest_rate: loan.interest_rate,
            due_date: loan.due_date.0,
            active: loan.is_active,
            funded: loan.is_funded,
            repaid: loan.is_repaid,
        })
    }
}

/// Writes the loan table as CSV.
pub struct LoanWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LoanWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_loans(&mut self, loans: &[Loan]) -> Result<()> {
        for loan in loans {
            self.writer.serialize(LoanRow::from_loan(loan)?)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    account: &'a str,
    received: Decimal,
}

/// Writes what each participant received from the registry as CSV.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_balances(&mut self, balances: &[(Address, Amount)]) -> Result<()> {
        for (account, received) in balances {
            self.writer.serialize(BalanceRow {
                account: account.as_str(),
                received: received.to_coins()?,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
