mod valuations_model;
mod valuations_traits;

pub use valuations_model::{FundValuation, NewFundValuation, PortfolioValuation};
pub use valuations_traits::ValuationRepositoryTrait;
