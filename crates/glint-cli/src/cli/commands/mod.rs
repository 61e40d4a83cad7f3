//! Command handlers.

pub mod config;
pub mod interactive;
pub mod logout;
pub mod search;
