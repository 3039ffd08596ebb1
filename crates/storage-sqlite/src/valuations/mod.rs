//! SQLite storage implementation for fund and portfolio valuations.

mod model;
mod repository;

pub use model::{FundValuationDB, NewFundValuationDB, NewPortfolioValuationDB, PortfolioValuationDB};
pub use repository::ValuationRepository;
