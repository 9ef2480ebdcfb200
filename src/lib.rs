pub mod api;
pub mod config;
pub mod error;
pub mod rewrite;
pub mod state;
pub mod storage;
