//! SQLite storage implementation for stored IRR values.

mod model;
mod repository;

pub use model::{IrrValueDB, NewIrrValueDB};
pub use repository::StoredIrrRepository;
