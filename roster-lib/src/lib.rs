pub mod auth;
pub mod config;
mod error;
pub mod event;
pub mod repository;
pub mod share;
mod state;
pub mod tracing;
pub mod user;

pub use error::FlowError;
