//! Activities module - activity log models and repository trait.

mod activities_constants;
mod activities_model;
mod activities_traits;


pub use activities_constants::*;
pub use activities_model::{Activity, ActivityType, FlowCategory, FlowDirection, NewActivity};
pub use activities_traits::ActivityRepositoryTrait;
