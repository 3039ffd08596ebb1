//! Wealthdesk Core - Domain entities, services, and traits.
//!
//! This crate contains the fund performance logic for Wealthdesk: cash-flow
//! extraction, the IRR solver and result cache, the ordered transaction
//! coordinator and scheduled transactions. It is database-agnostic and
//! defines traits that are implemented by the `storage-sqlite` crate.

pub mod activities;
pub mod constants;
pub mod errors;
pub mod irr;
pub mod portfolios;
pub mod scheduled;
pub mod transactions;
pub mod valuations;

#[cfg(test)]
mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
