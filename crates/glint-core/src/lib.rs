//! Core library for Glint: configuration, the generative search client,
//! the identity delegate, the session broadcast, and pagination/gating.

pub mod config;
pub mod identity;
pub mod logging;
pub mod paging;
pub mod search;
pub mod session;
