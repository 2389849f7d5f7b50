pub mod application;
pub mod dialog;
pub mod executor;
pub mod receive_log;
pub mod state;
pub mod style;
pub mod types;
