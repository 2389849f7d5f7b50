pub mod args;
pub mod types;
