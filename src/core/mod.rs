pub mod campaign;
pub mod config;
pub mod segment;
pub mod user_type;
