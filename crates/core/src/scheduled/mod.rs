//! Recurring and one-time future activities.

mod scheduled_model;
mod scheduled_service;
mod scheduled_traits;


pub use scheduled_model::*;
pub use scheduled_service::ScheduledTransactionService;
pub use scheduled_traits::{ScheduledTransactionRepositoryTrait, ScheduledTransactionServiceTrait};
