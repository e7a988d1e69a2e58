//! Domain layer: value objects, the `Loan` entity and the ports the registry talks through.

pub mod amount;
pub mod event;
pub mod loan;
pub mod ports;
