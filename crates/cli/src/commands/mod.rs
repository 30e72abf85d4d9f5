//! Subcommand implementations.
//!
//! Each command prints its result to stdout; logs and errors go to stderr.

pub mod cart;
pub mod checkout;
pub mod products;
