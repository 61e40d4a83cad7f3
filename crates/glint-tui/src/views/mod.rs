//! Screen-specific render functions.

pub mod entry;
pub mod login;
pub mod results;
