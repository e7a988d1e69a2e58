//! CSV boundary of the command-line driver.

pub mod command_reader;
pub mod loan_writer;
