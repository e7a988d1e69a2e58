use crate::domain::amount::Amount;
use crate::domain::loan::{Address, LoanId, Timestamp};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoanError>;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("loan {0} does not exist")]
    NotFound(LoanId),
    #[error("caller {caller} is not the {role} of loan {id}")]
    Unauthorized {
        id: LoanId,
        caller: Address,
        role: &'static str,
    },
    #[error("loan {id} is {state}")]
    InvalidState { id: LoanId, state: &'static str },
    #[error("invalid amount: expected {expected}, got {supplied}")]
    InvalidAmount { expected: String, supplied: Amount },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("loan {id} expired at {due_date}, now {now}")]
    Expired {
        id: LoanId,
        due_date: Timestamp,
        now: Timestamp,
    },
    #[error("loan {id} is not due until {due_date}, now {now}")]
    NotYetDue {
        id: LoanId,
        due_date: Timestamp,
        now: Timestamp,
    },
    #[error("transfer of {amount} to {to} failed")]
    TransferFailed { to: Address, amount: Amount },
    #[error("arithmetic overflow")]
    Overflow,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LoanError {
    fn from(err: rocksdb::Error) -> Self {
        Self::InternalError(Box::new(err))
    }
}

impl From<serde_json::Error> for LoanError {
    fn from(err: serde_json::Error) -> Self {
        Self::InternalError(Box::new(err))
    }
}
