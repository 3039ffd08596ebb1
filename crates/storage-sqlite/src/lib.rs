//! SQLite storage implementation for Wealthdesk.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `wealthdesk-core` and contains:
//! - Database connection pooling and the single-writer actor
//! - Diesel migrations
//! - Repository implementations for portfolios, activities, valuations,
//!   stored IRR values and scheduled transactions
//!
//! All writes are funnelled through [`WriteHandle`], which runs each job inside an
//! immediate transaction on one dedicated connection. Reads use the pool.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod activities;
pub mod irr;
pub mod portfolios;
pub mod scheduled;
pub mod valuations;

pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use activities::ActivityRepository;
pub use irr::StoredIrrRepository;
pub use portfolios::PortfolioRepository;
pub use scheduled::ScheduledTransactionRepository;
pub use valuations::ValuationRepository;

pub use wealthdesk_core::errors::{DatabaseError, Error, Result};
