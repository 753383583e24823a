pub mod admin;
pub mod response;

pub use admin::require_admin;
pub use response::{ApiResponse, ApiResult};
