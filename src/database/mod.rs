pub mod course;
pub mod manager;
pub mod user;

pub use manager::{DatabaseError, DatabaseManager};
