//! SQLite storage implementation for the activity log.

mod model;
mod repository;

pub use model::{ActivityLogDB, NewActivityLogDB};
pub use repository::ActivityRepository;
