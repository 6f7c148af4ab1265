pub mod file;
pub mod query;
pub mod summary;
pub mod user;
