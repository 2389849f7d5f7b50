pub mod connection;
pub mod constants;
pub mod list;
pub mod scanner;
pub mod transfer;
pub mod types;
