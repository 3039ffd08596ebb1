//! SQLite storage implementation for scheduled transactions.

mod model;
mod repository;

pub use model::{NewScheduledTransactionDB, ScheduledTransactionDB};
pub use repository::ScheduledTransactionRepository;
