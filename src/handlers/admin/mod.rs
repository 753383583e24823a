pub mod allowlist;
pub mod courses;
pub mod whoami;

pub use allowlist::allowlist_summary;
pub use courses::update_course;
pub use whoami::whoami;
