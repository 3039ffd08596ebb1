//! SQLite storage implementation for portfolios and their funds.

mod model;
mod repository;

pub use model::{NewPortfolioDB, NewPortfolioFundDB, PortfolioDB, PortfolioFundDB};
pub use repository::PortfolioRepository;
