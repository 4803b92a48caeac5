pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod scheduler;
pub mod session;
