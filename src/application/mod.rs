//! Application layer containing the money-movement orchestration.
//!
//! This module defines the `LedgerEngine`, the primary entry point for
//! every balance-affecting operation, and the cashback settlement that runs
//! as a preamble inside each of those operations.

pub mod cashback;
pub mod command;
pub mod engine;
