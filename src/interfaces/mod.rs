//! Batch interfaces for the command-line binary.

pub mod csv;
