//! Domain layer: account and ledger value types plus the storage ports the
//! application layer drives.

pub mod account;
pub mod ledger;
pub mod ports;

/// Caller-supplied logical time, milliseconds since epoch.
pub type Timestamp = i64;

/// Storage-assigned, strictly increasing ledger row id.
pub type TransactionId = u64;
