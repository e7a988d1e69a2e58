//! Application layer containing the loan lifecycle orchestration.
//!
//! `LoanRegistry` is the entry point for every operation. `Settlement` gives each
//! mutating operation its all-or-nothing behavior on top of the store and ledger ports.

pub mod registry;
pub mod settlement;
