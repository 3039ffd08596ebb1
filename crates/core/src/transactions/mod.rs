//! Ordered save of activities and valuations, followed by IRR recalculation.

mod transactions_model;
mod transactions_service;
mod transactions_traits;


pub use transactions_model::*;
pub use transactions_service::OrderedTransactionService;
pub use transactions_traits::OrderedTransactionServiceTrait;
