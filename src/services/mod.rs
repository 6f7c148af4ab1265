pub mod accounting;
pub mod file_service;
pub mod query_builder;
pub mod user_service;
