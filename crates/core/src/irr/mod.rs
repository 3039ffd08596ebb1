//! IRR module - cash-flow extraction, solving, caching and stored results.

mod cache;
mod cash_flow_extractor;
mod irr_errors;
mod irr_model;
mod irr_service;
mod irr_traits;
pub mod solver;


pub use cache::{CacheEntry, CacheStats, IrrCache, IrrCacheKey};
pub use cash_flow_extractor::CashFlowExtractor;
pub use irr_errors::IrrError;
pub use irr_model::*;
pub use irr_service::IrrService;
pub use irr_traits::{IrrServiceTrait, StoredIrrRepositoryTrait};
