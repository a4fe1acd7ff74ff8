pub mod config;
pub mod rows;
pub mod table;
